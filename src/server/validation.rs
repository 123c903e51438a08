const MAX_NAMESPACE_NAME_LEN: usize = 64;
const MAX_REPO_NAME_LEN: usize = 128;

fn is_valid_name_char(c: char, allow_period: bool) -> bool {
    c.is_ascii_lowercase()
        || c.is_ascii_digit()
        || c == '-'
        || c == '_'
        || (allow_period && c == '.')
}

fn validate_name(
    name: &str,
    entity: &str,
    max_len: usize,
    allow_period: bool,
) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("{entity} name cannot be empty"));
    }
    if name.len() > max_len {
        return Err(format!("{entity} name cannot exceed {max_len} characters"));
    }
    if !name.chars().all(|c| is_valid_name_char(c, allow_period)) {
        let mut allowed = "lowercase alphanumeric characters, hyphens, and underscores".to_string();
        if allow_period {
            allowed.push_str(", and periods");
        }
        return Err(format!("{entity} name can only contain {allowed}"));
    }
    if !name.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        return Err(format!("{entity} name must start with a letter or digit"));
    }
    Ok(())
}

/// Usernames and team names double as namespace names.
pub fn validate_namespace_name(name: &str) -> Result<(), String> {
    validate_name(name, "Namespace", MAX_NAMESPACE_NAME_LEN, false)
}

pub fn validate_repo_name(name: &str) -> Result<(), String> {
    validate_name(name, "Repository", MAX_REPO_NAME_LEN, true)
}
