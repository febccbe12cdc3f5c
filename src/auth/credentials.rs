/// Checks a submitted username/password pair.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// The single configured account, compared by exact string equality.
#[derive(Debug, Clone)]
pub struct StaticCredential {
    username: String,
    password: String,
}

impl StaticCredential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl CredentialVerifier for StaticCredential {
    fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("admin", "password123", true)]
    #[case("admin", "password1234", false)]
    #[case("Admin", "password123", false)]
    #[case("admin ", "password123", false)]
    #[case("", "", false)]
    #[case("root", "password123", false)]
    fn exact_match_only(#[case] username: &str, #[case] password: &str, #[case] expected: bool) {
        let cred = StaticCredential::new("admin", "password123");
        assert_eq!(cred.verify(username, password), expected);
    }
}
