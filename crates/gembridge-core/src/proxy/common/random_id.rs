use rand::Rng;

/// Random alphanumeric string of `len` characters.
pub fn generate_random_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// `chatcmpl-` followed by 29 alphanumerics, the length OpenAI clients expect.
pub fn generate_completion_id() -> String {
    format!("chatcmpl-{}", generate_random_id(29))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_id_shape() {
        let id = generate_completion_id();
        assert_eq!(id.len(), "chatcmpl-".len() + 29);
        assert!(id["chatcmpl-".len()..].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, generate_completion_id());
    }
}
