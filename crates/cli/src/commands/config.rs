use guidepost_core::config::{GuidepostConfig, LoadOptions};

pub fn run() -> String {
    let config = match GuidepostConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let mut lines =
        vec!["effective config (source precedence: overrides > env > file > default):".to_string()];

    lines.push(render_line("database.url", &config.database.url));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
    ));
    lines.push(render_line("database.timeout_secs", &config.database.timeout_secs.to_string()));

    lines.push(render_line("gemini.api_key", redacted_presence(config.gemini.api_key.is_some())));
    lines.push(render_line("gemini.base_url", &config.gemini.base_url));
    lines.push(render_line("gemini.model", &config.gemini.model));
    lines.push(render_line("gemini.timeout_secs", &config.gemini.timeout_secs.to_string()));

    lines.push(render_line("image.api_token", redacted_presence(config.image.api_token.is_some())));
    lines.push(render_line("image.base_url", &config.image.base_url));
    lines.push(render_line("image.model", &config.image.model));
    lines.push(render_line("image.poll_interval_ms", &config.image.poll_interval_ms.to_string()));
    lines.push(render_line(
        "image.max_poll_attempts",
        &config.image.max_poll_attempts.to_string(),
    ));

    lines.push(render_line("storage.base_url", &config.storage.base_url));
    lines.push(render_line("storage.bucket", &config.storage.bucket));
    lines.push(render_line("storage.api_key", redacted_presence(config.storage.api_key.is_some())));

    lines.push(render_line("chat.webhook_url", &config.chat.webhook_url));
    lines.push(render_line("chat.no_reply_text", &config.chat.no_reply_text));

    lines.push(render_line("server.bind_address", &config.server.bind_address));
    lines.push(render_line("server.port", &config.server.port.to_string()));

    lines.push(render_line("logging.level", &config.logging.level));
    lines.push(render_line("logging.format", &format!("{:?}", config.logging.format)));

    lines.join("\n")
}

fn render_line(key: &str, value: &str) -> String {
    format!("- {key} = {value}")
}

fn redacted_presence(present: bool) -> &'static str {
    if present {
        "<redacted>"
    } else {
        "<unset>"
    }
}
