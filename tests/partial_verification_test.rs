use polypasshash::{Vault, VaultBuilder, VaultError};

const THRESHOLD: u8 = 10;

fn populated_vault(partial_bytes: u8) -> Vault {
    let mut vault = VaultBuilder::new(THRESHOLD)
        .with_partial_bytes(partial_bytes)
        .build()
        .unwrap();

    vault.create_account("admin", "correct horse", 5).unwrap();
    vault.create_account("root", "battery staple", 5).unwrap();
    vault
        .create_account("superuser", "purple monkey dishwasher", 5)
        .unwrap();

    vault.create_account("alice", "kitten", 1).unwrap();
    vault.create_account("bob", "puppy", 1).unwrap();
    vault.create_account("charlie", "velociraptor", 1).unwrap();
    vault.create_account("dennis", "menace", 0).unwrap();
    vault.create_account("eve", "iamevil", 0).unwrap();

    vault
}

#[test]
fn test_locked_logins_with_partial_bytes() {
    let vault = populated_vault(2);

    // Fresh vault behaves as usual
    assert!(vault.is_valid_login("alice", "kitten").unwrap());
    assert!(!vault.is_valid_login("alice", "nyancat!").unwrap());

    let mut file = Vec::new();
    vault.write_password_data(&mut file).unwrap();

    let mut reloaded = VaultBuilder::new(THRESHOLD)
        .with_partial_bytes(2)
        .load(&file[..])
        .unwrap();

    // Still locked, but the stored digest suffix answers login checks
    assert!(!reloaded.is_unlocked());
    assert!(reloaded.is_valid_login("alice", "kitten").unwrap());
    assert!(!reloaded.is_valid_login("alice", "nyancat!").unwrap());
    assert!(reloaded.is_valid_login("dennis", "menace").unwrap());
    assert!(!reloaded.is_valid_login("dennis", "password").unwrap());

    // Partial verification never permits account creation
    assert!(matches!(
        reloaded.create_account("moe", "tadpole", 1),
        Err(VaultError::Locked)
    ));

    reloaded
        .unlock_password_data(&[
            ("admin", "correct horse"),
            ("root", "battery staple"),
            ("bob", "puppy"),
            ("dennis", "menace"),
        ])
        .unwrap();

    assert!(reloaded.is_valid_login("alice", "kitten").unwrap());
    reloaded.create_account("moe", "tadpole", 1).unwrap();
    reloaded.create_account("larry", "fish", 0).unwrap();
    assert!(reloaded.is_valid_login("moe", "tadpole").unwrap());
    assert!(reloaded.is_valid_login("larry", "fish").unwrap());
}

#[test]
fn test_locked_login_without_partial_bytes_is_an_error() {
    let vault = populated_vault(0);
    let mut file = Vec::new();
    vault.write_password_data(&mut file).unwrap();

    let reloaded = VaultBuilder::new(THRESHOLD).load(&file[..]).unwrap();
    assert!(matches!(
        reloaded.is_valid_login("alice", "kitten"),
        Err(VaultError::Locked)
    ));
    // An unknown user is reported as such, not as a locked vault
    assert!(matches!(
        reloaded.is_valid_login("nobody", "kitten"),
        Err(VaultError::UnknownUser)
    ));
}

#[test]
fn test_false_accept_rate_is_bounded() {
    // Three suffix bytes put a single false accept around 2^-24; a batch of
    // wrong guesses must all be rejected.
    let mut vault = VaultBuilder::new(2).with_partial_bytes(3).build().unwrap();
    vault.create_account("admin", "correct horse", 2).unwrap();
    vault.create_account("alice", "kitten", 1).unwrap();

    let mut file = Vec::new();
    vault.write_password_data(&mut file).unwrap();
    let locked = VaultBuilder::new(2)
        .with_partial_bytes(3)
        .load(&file[..])
        .unwrap();

    assert!(locked.is_valid_login("alice", "kitten").unwrap());

    let mut accepted = 0usize;
    for attempt in 0..256 {
        let guess = format!("wrong password {attempt}");
        if locked.is_valid_login("alice", guess.as_bytes()).unwrap() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 0);
}

#[test]
fn test_partial_suffix_layout() {
    let mut vault = VaultBuilder::new(2).with_partial_bytes(4).build().unwrap();
    vault.create_account("admin", "correct horse", 2).unwrap();
    vault.create_account("eve", "iamevil", 0).unwrap();

    let accounts = vault.accounts();
    // Masked verifier body (32) plus four suffix bytes
    assert_eq!(accounts[b"admin".as_slice()][0].pass_hash.len(), 36);
    // Thresholdless body is a single cipher block (16) plus the suffix
    assert_eq!(accounts[b"eve".as_slice()][0].pass_hash.len(), 20);
}
