use anyhow::Result;
use quay::{
    context::CallContext,
    handler::{completion_fn, list_fn, prompt_fn, resource_fn, template_fn},
    serve, transport, MCPServiceBuilder, PromptError, RegisteredPrompt, RegisteredTemplate,
    ResourceError, ServerConfig, ServiceExt,
};
use quay_mcp_protocol::{
    content::Role,
    prompt::{Prompt, PromptArgument, PromptMessage},
    resource::{Resource, ResourceContents, ResourceTemplate},
};
use serde_json::{json, Value};
use std::{collections::BTreeMap, sync::Arc};
use tracing_subscriber::{self, EnvFilter};

struct Profile {
    name: &'static str,
    role: &'static str,
}

type Directory = Arc<BTreeMap<&'static str, Profile>>;

fn directory() -> Directory {
    Arc::new(BTreeMap::from([
        ("1", Profile { name: "Alice", role: "admin" }),
        ("2", Profile { name: "Bob", role: "developer" }),
        ("10", Profile { name: "Carol", role: "developer" }),
    ]))
}

fn profile_template(users: Directory) -> Result<RegisteredTemplate> {
    let readable = users.clone();
    let listable = users.clone();

    let template = RegisteredTemplate::new(
        ResourceTemplate::new("user_profile", "users://{userId}/profile")
            .with_description("A user's profile")
            .with_mime_type("application/json"),
        template_fn(move |uri, vars, _ctx| {
            let users = readable.clone();
            async move {
                let id = vars.get("userId").cloned().unwrap_or_default();
                let profile = users
                    .get(id.as_str())
                    .ok_or_else(|| ResourceError::NotFound(uri.clone()))?;
                let body = json!({"id": id, "name": profile.name, "role": profile.role});
                Ok::<_, ResourceError>(
                    ResourceContents::text(uri, body.to_string()).with_mime_type("application/json"),
                )
            }
        }),
    )?
    .with_list_handler(list_fn(move |_ctx| {
        let users = listable.clone();
        async move {
            Ok(users
                .iter()
                .map(|(id, profile)| Resource::new(format!("users://{}/profile", id), profile.name))
                .collect::<Vec<_>>())
        }
    }))
    .with_completion(
        "userId",
        completion_fn(move |prefix, _ctx| {
            let users = users.clone();
            async move {
                Ok(users
                    .keys()
                    .filter(|id| id.starts_with(prefix.as_str()))
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>())
            }
        }),
    );
    Ok(template)
}

fn greeting_prompt() -> RegisteredPrompt {
    RegisteredPrompt::new(
        Prompt::new("greet_user")
            .with_description("Write a greeting for a user")
            .with_argument(PromptArgument::required("name", "Who to greet"))
            .with_argument(PromptArgument::optional("tone", "formal or casual")),
        prompt_fn(|args, _ctx: CallContext| async move {
            let name = args
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| PromptError::InvalidArguments("name must be a string".into()))?;
            let tone = args.get("tone").and_then(Value::as_str).unwrap_or("casual");
            Ok::<_, PromptError>(vec![PromptMessage::new_text(
                Role::User,
                format!("Write a {} greeting for {}.", tone, name),
            )])
        }),
    )
    .with_completion(
        "tone",
        completion_fn(|prefix, _ctx| async move {
            Ok(["casual", "formal"]
                .iter()
                .filter(|tone| tone.starts_with(prefix.as_str()))
                .map(|tone| tone.to_string())
                .collect::<Vec<_>>())
        }),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging
    let log_dir = tempfile::tempdir()?;
    let file_appender = tracing_appender::rolling::daily(log_dir.path(), "server.log");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(file_appender)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // MCP_SERVER_NAME, MCP_SERVER_VERSION, MCP_INSTRUCTIONS and MCP_LOG_ERRORS override these
    let mut config = ServerConfig::from_env()?;
    if config.instructions.is_none() {
        config = config.with_instructions("Browse user profiles as resources.");
    }

    let service = MCPServiceBuilder::from_config(config)
        .with_resource(
            Resource::new("directory://stats", "Directory statistics")
                .with_mime_type("application/json"),
            resource_fn(|uri, _ctx| async move {
                Ok(ResourceContents::text(uri, json!({"users": 3}).to_string())
                    .with_mime_type("application/json"))
            }),
        )?
        .with_resource_template(profile_template(directory())?)?
        .with_registered_prompt(greeting_prompt())?
        .build();

    tracing::info!(
        "Starting server over stdin. Logging to {}",
        log_dir.path().display()
    );

    serve(service.into_request_service(), transport::stdio()).await?;

    Ok(())
}
