//! App manifest in Slack's JSON manifest layout: display information, bot scopes, outgoing
//! domains and the parse-message function definition.
//!
//! Printed by `newsletter manifest` for registering the app with Slack.

use serde::Serialize;
use serde_json::{json, Value};

pub const APP_NAME: &str = "newsletter-automation";
pub const APP_DESCRIPTION: &str =
    "Newsletter Automation that helps us transform posts/messages into internal newsletter";
pub const FUNCTION_CALLBACK_ID: &str = "parse_message_function";
pub const MANIFEST_MAJOR_VERSION: u32 = 2;

pub const BOT_SCOPES: &[&str] = &[
    "chat:write",
    "im:read",
    "im:history",
    "chat:write.public",
    "groups:write",
    "groups:history",
    "datastore:read",
    "datastore:write",
    "canvases:read",
    "canvases:write",
    "channels:history",
    "channels:read",
    "mpim:history",
];

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    #[serde(rename = "_metadata")]
    pub metadata: Metadata,
    pub display_information: DisplayInformation,
    pub oauth_config: OauthConfig,
    pub settings: Settings,
    pub outgoing_domains: Vec<String>,
    pub functions: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub major_version: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisplayInformation {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OauthConfig {
    pub scopes: Scopes,
}

#[derive(Debug, Clone, Serialize)]
pub struct Scopes {
    pub bot: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Functions are served by this process, not hosted by Slack.
    pub function_runtime: String,
}

fn string_param(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

/// Input/output schema of the parse-message function. `canvas_id` is only required when no
/// default canvas is configured to fall back on.
pub fn parse_message_function(default_canvas_configured: bool) -> Value {
    let mut required = vec!["channel_id", "message_ts", "channel_name"];
    if !default_canvas_configured {
        required.push("canvas_id");
    }
    json!({
        "title": "Parse Message Function",
        "description": "A function to parse a message",
        "input_parameters": {
            "properties": {
                "channel_id": string_param("The channel where the reaction was added"),
                "channel_name":
                    string_param("The name of the channel where the reaction was added"),
                "message_ts": string_param("The timestamp of the message that was reacted to"),
                "canvas_id": string_param("The canvas id where the message will be added"),
            },
            "required": required,
        },
        "output_parameters": {
            "properties": {
                "parsedMsg": string_param("Parsed message"),
            },
            "required": ["parsedMsg"],
        },
    })
}

pub fn manifest(default_canvas_configured: bool) -> Manifest {
    let mut functions = serde_json::Map::new();
    functions.insert(
        FUNCTION_CALLBACK_ID.to_string(),
        parse_message_function(default_canvas_configured),
    );
    Manifest {
        metadata: Metadata {
            major_version: MANIFEST_MAJOR_VERSION,
        },
        display_information: DisplayInformation {
            name: APP_NAME.to_string(),
            description: APP_DESCRIPTION.to_string(),
        },
        oauth_config: OauthConfig {
            scopes: Scopes {
                bot: BOT_SCOPES.iter().map(|s| s.to_string()).collect(),
            },
        },
        settings: Settings {
            function_runtime: "remote".to_string(),
        },
        outgoing_domains: Vec::new(),
        functions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_uses_slack_layout() {
        let v = serde_json::to_value(manifest(false)).unwrap();
        assert_eq!(v["_metadata"]["major_version"], 2);
        assert_eq!(v["display_information"]["name"], APP_NAME);
        assert_eq!(v["display_information"]["description"], APP_DESCRIPTION);
        assert_eq!(v["settings"]["function_runtime"], "remote");
        assert_eq!(v["outgoing_domains"], json!([]));
        let bot = v["oauth_config"]["scopes"]["bot"].as_array().unwrap();
        for scope in ["canvases:write", "channels:history", "groups:history"] {
            assert!(bot.iter().any(|s| s == scope), "missing {}", scope);
        }
        assert!(v.get("name").is_none());
        assert!(v.get("bot_scopes").is_none());
    }

    #[test]
    fn function_schema_matches_input_fields() {
        let v = serde_json::to_value(manifest(false)).unwrap();
        let f = &v["functions"][FUNCTION_CALLBACK_ID];
        let props = f["input_parameters"]["properties"].as_object().unwrap();
        let keys: Vec<&str> = props.keys().map(String::as_str).collect();
        assert_eq!(keys, ["channel_id", "channel_name", "message_ts", "canvas_id"]);
        assert_eq!(
            f["input_parameters"]["required"],
            json!(["channel_id", "message_ts", "channel_name", "canvas_id"])
        );
        assert_eq!(f["output_parameters"]["required"][0], "parsedMsg");
    }

    #[test]
    fn canvas_id_is_optional_with_default_canvas() {
        let v = serde_json::to_value(manifest(true)).unwrap();
        let f = &v["functions"][FUNCTION_CALLBACK_ID];
        assert_eq!(
            f["input_parameters"]["required"],
            json!(["channel_id", "message_ts", "channel_name"])
        );
        assert!(f["input_parameters"]["properties"]["canvas_id"].is_object());
    }
}
