use rand::{Rng, distributions::Uniform};

/// Length of generated working-directory identifiers.
pub const ID_LEN: usize = 10;

/// Source of working-directory identifiers.
///
/// Every job preparation asks for a fresh id, so identifiers must not repeat in
/// practice across concurrent invocations sharing one working root.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random ids of [`ID_LEN`] lowercase ASCII letters (26^10 combinations).
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> String {
        let letters = Uniform::new_inclusive(b'a', b'z');
        rand::thread_rng()
            .sample_iter(letters)
            .take(ID_LEN)
            .map(char::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{ID_LEN, IdGenerator, RandomIds};

    #[test]
    fn ids_are_ten_lowercase_letters() {
        let id = RandomIds.next_id();
        assert_eq!(id.len(), ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_lowercase()), "bad id {id}");
    }

    #[test]
    fn ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1_000).map(|_| RandomIds.next_id()).collect();
        assert_eq!(ids.len(), 1_000);
    }
}
