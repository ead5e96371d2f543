use rand::{rngs::OsRng, RngCore};
use time::OffsetDateTime;

/// Builds an opaque session token: `<hex(random bytes)>_<unix seconds>_<micros, 6 digits>`.
///
/// Consumers never parse the token back; uniqueness is left to the store constraint.
pub fn generate(length: usize) -> String {
    let mut random = vec![0u8; length];
    OsRng.fill_bytes(&mut random);
    let now = OffsetDateTime::now_utc();
    format!(
        "{}_{}_{:06}",
        hex::encode(random),
        now.unix_timestamp(),
        now.microsecond()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_has_three_underscore_separated_parts() {
        let token = generate(32);
        let parts: Vec<&str> = token.split('_').collect();
        assert_eq!(parts.len(), 3);

        assert_eq!(parts[0].len(), 64);
        assert!(parts[0]
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));

        let secs: i64 = parts[1].parse().expect("seconds part is numeric");
        assert!(secs > 1_600_000_000);

        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].parse::<u32>().expect("micros numeric") < 1_000_000);
    }

    #[test]
    fn random_part_follows_requested_length() {
        let token = generate(4);
        assert_eq!(token.split('_').next().unwrap().len(), 8);
    }

    #[test]
    fn consecutive_tokens_differ() {
        assert_ne!(generate(32), generate(32));
    }
}
