//! Greeting caption substitution.
//!
//! Stored greetings use two bare tokens: `user` is replaced with the member
//! mention and `server` with the guild name. Replacement is a plain substring
//! replace applied in that order, so a template containing "username" becomes
//! "<@id>name". That matches how guilds have been writing their templates and
//! is kept as-is.

/// Token replaced with the member mention.
pub const USER_TOKEN: &str = "user";

/// Token replaced with the guild name.
pub const SERVER_TOKEN: &str = "server";

/// Mention markup for a member id.
pub fn mention(member_id: u64) -> String {
    format!("<@{member_id}>")
}

/// Substitute the mention and guild name into a greeting template.
pub fn render_greeting(template: &str, mention: &str, guild_name: &str) -> String {
    template
        .replace(USER_TOKEN, mention)
        .replace(SERVER_TOKEN, guild_name)
}

/// Caption used when a guild has no stored greeting.
pub fn default_greeting(member_name: &str, guild_name: &str) -> String {
    format!("Welcome {member_name} to {guild_name}!")
}

/// Build the caption for a join, falling back to [`default_greeting`] when
/// the template is missing or blank.
pub fn caption_for(
    template: Option<&str>,
    member_id: u64,
    member_name: &str,
    guild_name: &str,
) -> String {
    match template {
        Some(t) if !t.trim().is_empty() => render_greeting(t, &mention(member_id), guild_name),
        _ => default_greeting(member_name, guild_name),
    }
}
