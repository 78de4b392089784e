use fspro_types::{Message, Sender};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

/// Presentation settings for message markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    pub assistant_name: String,
    pub markdown_user_messages: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            assistant_name: "FSPro Assistant".to_string(),
            markdown_user_messages: true,
        }
    }
}

/// Markup for one message bubble: the class list of the outer element and its inner HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedMessage {
    pub class_name: &'static str,
    pub inner_html: String,
}

/// Escape HTML to prevent XSS
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render a message bubble.
///
/// User text is untrusted and is always escaped; bot text is markup produced
/// by the responder and is inserted as-is.
pub fn format_message(msg: &Message, options: &FormatOptions, time_label: &str) -> FormattedMessage {
    let content = match msg.sender {
        Sender::User => render_user_text(&msg.text, options.markdown_user_messages),
        Sender::Bot => msg.text.clone(),
    };

    FormattedMessage {
        class_name: message_class(msg.sender),
        inner_html: bubble_html(msg.sender, options, &content, time_label),
    }
}

/// The "assistant is typing" bubble shown while a reply is outstanding
pub fn typing_indicator(options: &FormatOptions, time_label: &str) -> FormattedMessage {
    let content = r#"<div class="typing-indicator"><span></span><span></span><span></span></div>"#;
    FormattedMessage {
        class_name: message_class(Sender::Bot),
        inner_html: bubble_html(Sender::Bot, options, content, time_label),
    }
}

fn message_class(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "message user-message",
        Sender::Bot => "message bot-message",
    }
}

fn bubble_html(sender: Sender, options: &FormatOptions, content: &str, time_label: &str) -> String {
    let (avatar, username) = match sender {
        Sender::User => ("U", "You".to_string()),
        Sender::Bot => ("FP", escape_html(&options.assistant_name)),
    };

    format!(
        r#"<div class="message-header"><div class="avatar">{}</div><div class="username">{}</div></div><div class="message-content">{}</div><div class="message-time">{}</div>"#,
        avatar,
        username,
        content,
        escape_html(time_label)
    )
}

fn render_user_text(text: &str, use_markdown: bool) -> String {
    if use_markdown {
        render_markdown(text)
    } else {
        format!("<p>{}</p>", escape_html(text).replace('\n', "<br>"))
    }
}

/// Light markdown for user input.
///
/// Raw HTML is turned back into text so it comes out escaped, soft breaks are
/// kept as line breaks, and links with script-capable schemes are defused.
fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::SoftBreak => Event::HardBreak,
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: defuse_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: defuse_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output.trim_end().to_string()
}

fn defuse_url(url: CowStr<'_>) -> CowStr<'_> {
    let scheme = url.trim_start().to_ascii_lowercase();
    if scheme.starts_with("javascript:") || scheme.starts_with("vbscript:") || scheme.starts_with("data:") {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

/// Drop anything that looks like a tag, leaving the text
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
