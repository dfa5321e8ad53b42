use crate::error::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// 邮箱验证工具函数
pub fn validate_email(email: &str) -> bool {
    validator::validate_email(email)
}

/// 验证邮箱并返回详细错误信息
pub fn validate_email_format(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(AppError::Validation("Email cannot be empty".to_string()));
    }

    if !validator::validate_email(email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }

    if email.len() > 254 {
        return Err(AppError::Validation("Email address is too long".to_string()));
    }

    Ok(())
}

/// 验证用户名格式
pub fn validate_username(username: &str) -> Result<()> {
    static USERNAME_REGEX: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("username regex is valid"));

    if username.trim().is_empty() {
        return Err(AppError::Validation("Username cannot be empty".to_string()));
    }

    if username.len() < 3 {
        return Err(AppError::Validation("Username must be at least 3 characters".to_string()));
    }

    if username.len() > 30 {
        return Err(AppError::Validation("Username cannot exceed 30 characters".to_string()));
    }

    // 用户名只能包含字母、数字、下划线和连字符
    if !USERNAME_REGEX.is_match(username) {
        return Err(AppError::Validation(
            "Username can only contain letters, numbers, underscores and hyphens".to_string(),
        ));
    }

    Ok(())
}

/// 验证口令强度（与注册表单的最低要求一致）
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 6 {
        return Err(AppError::Validation("Password must be at least 6 characters".to_string()));
    }

    if password.len() > 128 {
        return Err(AppError::Validation("Password is too long".to_string()));
    }

    Ok(())
}

/// 验证学习资源链接：必须是可解析的 http/https URL
pub fn validate_resource_url(raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|_| AppError::Validation("Resource url must be a valid URL".to_string()))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(AppError::Validation(
            "Resource url must use http or https".to_string(),
        )),
    }
}

/// 验证技能标签：非空、有长度上限
pub fn validate_skill(skill: &str) -> Result<()> {
    let skill = skill.trim();
    if skill.is_empty() {
        return Err(AppError::Validation("Skill cannot be empty".to_string()));
    }
    if skill.len() > 50 {
        return Err(AppError::Validation("Skill name cannot exceed 50 characters".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("test.email+tag@domain.co.uk"));

        assert!(!validate_email("invalid-email"));
        assert!(!validate_email("@domain.com"));
        assert!(!validate_email("user@"));
    }

    #[test]
    fn test_validate_email_format() {
        assert!(validate_email_format("user@example.com").is_ok());

        assert!(validate_email_format("").is_err());
        assert!(validate_email_format("invalid-email").is_err());
        assert!(validate_email_format(&"a".repeat(255)).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("user123").is_ok());
        assert!(validate_username("test_user").is_ok());
        assert!(validate_username("user-name").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("user@name").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret1").is_ok());
        assert!(validate_password("12345").is_err());
        assert!(validate_password(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_resource_url() {
        assert!(validate_resource_url("https://doc.rust-lang.org/book/").is_ok());
        assert!(validate_resource_url("http://example.com/video").is_ok());

        assert!(validate_resource_url("not a url").is_err());
        assert!(validate_resource_url("ftp://example.com/file").is_err());
        assert!(validate_resource_url("javascript:alert(1)").is_err());
    }

    #[test]
    fn test_validate_skill() {
        assert!(validate_skill("rust").is_ok());
        assert!(validate_skill("  ").is_err());
        assert!(validate_skill(&"a".repeat(51)).is_err());
    }
}
