use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use courier_envelope::{Envelope, KdfParams};
use courier_store::{
    CreateError, InMemoryRepository, PolicyViolation, Repository, RepositoryError, Secret,
    SecretKey, SecretPolicy, SecretService,
};
use proptest::prelude::*;

/// In-memory repository that counts writes.
#[derive(Default)]
struct CountingRepository {
    inner: InMemoryRepository,
    puts: AtomicUsize,
}

impl CountingRepository {
    fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Repository for CountingRepository {
    async fn put(&self, key: &SecretKey, secret: &Secret) -> Result<(), RepositoryError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, secret).await
    }

    async fn get(&self, key: &SecretKey) -> Result<Secret, RepositoryError> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &SecretKey) -> Result<bool, RepositoryError> {
        self.inner.delete(key).await
    }

    async fn status(&self, key: &SecretKey) -> Result<bool, RepositoryError> {
        self.inner.status(key).await
    }

    fn backend(&self) -> &'static str {
        "counting"
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn setup(policy: SecretPolicy) -> (SecretService, Arc<CountingRepository>) {
    init_tracing();
    let repo = Arc::new(CountingRepository::default());
    (SecretService::new(repo.clone(), policy), repo)
}

fn armored(plaintext: &[u8]) -> String {
    Envelope::with_kdf(KdfParams::new(64, 1, 1))
        .encrypt(plaintext, "passphrase")
        .unwrap()
}

#[tokio::test]
async fn one_time_secret_is_consumed() {
    let (svc, _) = setup(SecretPolicy::default());
    let key = svc
        .create_secret(&Secret::new(armored(b"once"), 3600, true))
        .await
        .unwrap();

    let first = svc.get_secret(&key).await.unwrap();
    assert!(first.one_time);
    assert!(matches!(svc.get_secret(&key).await, Err(RepositoryError::NotFound)));
}

#[tokio::test]
async fn multi_read_secret_is_stable() {
    let (svc, _) = setup(SecretPolicy::default());
    let message = armored(b"many");
    let key = svc
        .create_secret(&Secret::new(message.clone(), 86400, false))
        .await
        .unwrap();

    for _ in 0..5 {
        assert_eq!(svc.get_secret(&key).await.unwrap().message, message);
    }
}

#[tokio::test]
async fn status_does_not_consume() {
    let (svc, _) = setup(SecretPolicy::default());
    let key = svc
        .create_secret(&Secret::new(armored(b"peek"), 3600, true))
        .await
        .unwrap();

    assert!(svc.get_secret_status(&key).await.unwrap());
    assert!(svc.get_secret_status(&key).await.unwrap());
    assert!(svc.get_secret(&key).await.is_ok());
    assert!(svc.get_secret_status(&key).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn validation_gate() {
    let (svc, repo) = setup(SecretPolicy::default().with_force_one_time(true));

    let cases = [
        (Secret::new("plaintext", 3600, true), PolicyViolation::NotEncrypted),
        (Secret::new(armored(b"x"), 42, true), PolicyViolation::InvalidExpiration(42)),
        (Secret::new(armored(b"x"), 3600, false), PolicyViolation::OneTimeRequired),
    ];

    let mut seen = Vec::new();
    for (secret, expected) in cases {
        let err = svc.create_secret(&secret).await.unwrap_err();
        assert!(err.is_client_error());
        match err {
            CreateError::Rejected(v) => {
                assert_eq!(v, expected);
                assert!(!seen.contains(&v.to_string()));
                seen.push(v.to_string());
            }
            CreateError::Storage(e) => panic!("unexpected storage error: {e}"),
        }
    }
    assert_eq!(repo.puts(), 0);
}

#[tokio::test]
async fn oversize_rejected_before_storage() {
    let message = armored(&[7u8; 256]);
    let (svc, repo) = setup(SecretPolicy::default().with_max_length(message.len() - 1));
    let err = svc
        .create_secret(&Secret::new(message, 3600, false))
        .await
        .unwrap_err();
    assert!(matches!(err, CreateError::Rejected(PolicyViolation::TooLong { .. })));
    assert_eq!(repo.puts(), 0);
}

#[tokio::test]
async fn keys_are_fresh_uuids() {
    let (svc, repo) = setup(SecretPolicy::default());
    let message = armored(b"k");
    let a = svc
        .create_secret(&Secret::new(message.clone(), 3600, false))
        .await
        .unwrap();
    let b = svc
        .create_secret(&Secret::new(message, 3600, false))
        .await
        .unwrap();
    assert_ne!(a, b);
    assert!(SecretKey::parse(a.as_str()).is_some());
    assert!(SecretKey::parse(b.as_str()).is_some());
    assert_eq!(repo.puts(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_one_time_reads_have_one_winner() {
    let (svc, _) = setup(SecretPolicy::default());
    let key = svc
        .create_secret(&Secret::new(armored(b"race"), 3600, true))
        .await
        .unwrap();

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let svc = svc.clone();
            let key = key.clone();
            tokio::spawn(async move { svc.get_secret(&key).await })
        })
        .collect();

    let mut winners = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => assert!(e.is_not_found()),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn unknown_key_is_not_found() {
    let (svc, _) = setup(SecretPolicy::default());
    let key = SecretKey::generate();
    assert!(svc.get_secret(&key).await.unwrap_err().is_not_found());
    assert!(svc.get_secret_status(&key).await.unwrap_err().is_not_found());
    assert!(!svc.delete_secret(&key).await.unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_unarmored_never_stored(message in "[^-]{0,200}", expiration in any::<u32>(), one_time in any::<bool>()) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let (svc, repo) = setup(SecretPolicy::default());
        let result = rt.block_on(svc.create_secret(&Secret::new(message, expiration, one_time)));
        prop_assert!(matches!(result, Err(CreateError::Rejected(PolicyViolation::NotEncrypted))));
        prop_assert_eq!(repo.puts(), 0);
    }

    #[test]
    fn prop_unlisted_expiration_rejected(expiration in any::<u32>()) {
        prop_assume!(![3600, 86400, 604800].contains(&expiration));
        let message = "-----BEGIN PGP MESSAGE-----\n\nAAAA\n=AAAA\n-----END PGP MESSAGE-----\n";
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let (svc, repo) = setup(SecretPolicy::default());
        let result = rt.block_on(svc.create_secret(&Secret::new(message, expiration, true)));
        prop_assert!(matches!(
            result,
            Err(CreateError::Rejected(PolicyViolation::InvalidExpiration(e))) if e == expiration
        ));
        prop_assert_eq!(repo.puts(), 0);
    }
}
