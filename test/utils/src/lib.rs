/// History as returned by a backend that was just seeded with its default
/// system and info turns.
pub fn seeded_history_fixture() -> &'static str {
    return r#"
[
  { "role": "system", "content": "You are a helpful assistant" },
  { "role": "info", "content": "Hello!\n\nI'm a personal assistant chatbot. I will respond as best I can to any messages you send me." }
]
"#
    .trim();
}

/// History after a single exchange.
pub fn exchange_history_fixture() -> &'static str {
    return r#"
[
  { "role": "user", "content": "hello" },
  { "role": "assistant", "content": "hi!" }
]
"#
    .trim();
}

/// History as returned by the Streamlit flavoured backends, which use `type`
/// and `human`/`ai` in place of `role` and `user`/`assistant`.
pub fn typed_history_fixture() -> &'static str {
    return r#"
[
  { "type": "human", "content": "what is on the page?" },
  { "type": "ai", "content": "A cat." },
  { "type": "tool", "content": "search" }
]
"#
    .trim();
}
