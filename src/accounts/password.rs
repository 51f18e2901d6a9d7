//! PBKDF2-SHA256 password hashes in the `pbkdf2:sha256:<iterations>$<salt>$<hex>` layout

use constant_time_eq::constant_time_eq;
use rand::{distributions::Alphanumeric, Rng};
use sha2::Sha256;

const METHOD_PREFIX: &str = "pbkdf2:sha256";
const SALT_LENGTH: usize = 16;
const DIGEST_LENGTH: usize = 32;

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }

    pub fn hash(&self, password: &str) -> String {
        let salt = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SALT_LENGTH)
            .map(char::from)
            .collect::<String>();

        format!(
            "{}:{}${}${}",
            METHOD_PREFIX,
            self.iterations,
            salt,
            derive_hex(password, &salt, self.iterations)
        )
    }

    /// A well-formed hash no password matches, costing the same rounds as a real one
    pub fn dummy_hash(&self) -> String {
        format!(
            "{}:{}${}${}",
            METHOD_PREFIX,
            self.iterations,
            "0".repeat(SALT_LENGTH),
            "0".repeat(DIGEST_LENGTH * 2)
        )
    }
}

fn derive_hex(password: &str, salt: &str, iterations: u32) -> String {
    let mut output = [0u8; DIGEST_LENGTH];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut output);
    output.iter().map(|byte| format!("{:02x}", byte)).collect()
}

/// Checks `password` against a stored hash. Hashes in any other layout never verify.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let mut parts = stored_hash.splitn(3, '$');
    let (Some(method), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let iterations = match method
        .strip_prefix(METHOD_PREFIX)
        .and_then(|rest| rest.strip_prefix(':'))
        .and_then(|rounds| rounds.parse::<u32>().ok())
    {
        Some(iterations) if iterations > 0 => iterations,
        _ => {
            log::warn!("Unsupported password hash method {:?}", method);
            return false;
        }
    };

    let computed = derive_hex(password, salt, iterations);
    constant_time_eq(computed.as_bytes(), expected.as_bytes())
}
