use colored::Colorize;

use crate::message::{Message, Role};

/// Format a stored message for terminal display with role label and colors.
pub fn format_message(msg: &Message) -> String {
    let label = format_role_label(msg.role);
    let body = format_body(msg);
    format!("{}\n{}", label, body)
}

fn format_role_label(role: Role) -> String {
    match role {
        Role::User => format!("{}", "you:".green().bold()),
        Role::Assistant => format!("{}", "assistant:".cyan().bold()),
        Role::System => format!("{}", "system:".dimmed()),
        Role::Tool => format!("{}", "tool:".yellow()),
    }
}

fn format_body(msg: &Message) -> String {
    let mut lines = Vec::new();
    let text = msg.text();
    if !text.is_empty() {
        lines.push(match msg.role {
            Role::User | Role::Assistant => text,
            _ => text.dimmed().to_string(),
        });
    }
    for call in &msg.tool_calls {
        lines.push(format!(
            "{} {}({})",
            "requested".yellow(),
            call.function_name.bold(),
            call.arguments_text.dimmed()
        ));
    }
    let images = msg.image_count();
    if images > 0 {
        lines.push(format!("[{} image(s) attached]", images).dimmed().to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Content, ContentPart, ToolCallRequest};

    #[test]
    fn test_tool_call_and_images_are_annotated() {
        let call = Message::assistant_tool_call(ToolCallRequest {
            id: "c".into(),
            function_name: "math_solver".into(),
            arguments_text: "{}".into(),
        });
        let out = format_message(&call);
        assert!(out.contains("assistant:"));
        assert!(out.contains("math_solver"));

        let user = Message::user(Content::Parts(vec![
            ContentPart::Text { text: "look".into() },
            ContentPart::image("data:image/png;base64,AA"),
            ContentPart::image("data:image/png;base64,BB"),
        ]));
        let out = format_message(&user);
        assert!(out.contains("look"));
        assert!(out.contains("2 image(s) attached"));
        assert!(!out.contains("base64"));
    }
}
