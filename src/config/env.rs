use crate::gateway::Credentials;

/// Build credentials from a variable lookup.
///
/// `PIXELSMITH_*_API_KEY` wins over the provider's conventional variable.
pub fn credentials_from(lookup: impl Fn(&str) -> Option<String>) -> Credentials {
    let primary = lookup("PIXELSMITH_OPENAI_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
    let groq = lookup("PIXELSMITH_GROQ_API_KEY").or_else(|| lookup("GROQ_API_KEY"));
    Credentials::new(primary, groq)
}

pub fn credentials_from_env() -> Credentials {
    credentials_from(|key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Provider;

    #[test]
    fn test_prefixed_keys_take_precedence() {
        let creds = credentials_from(|key| match key {
            "PIXELSMITH_OPENAI_API_KEY" => Some("sk-app".to_string()),
            "OPENAI_API_KEY" => Some("sk-shell".to_string()),
            "GROQ_API_KEY" => Some("gsk-shell".to_string()),
            _ => None,
        });
        assert_eq!(creds.for_provider(Provider::OpenAi), Some("sk-app"));
        assert_eq!(creds.for_provider(Provider::Groq), Some("gsk-shell"));
    }

    #[test]
    fn test_no_keys() {
        let creds = credentials_from(|_| None);
        assert!(creds.is_empty());
    }
}
