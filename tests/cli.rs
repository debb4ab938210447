use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use stegkey::{PixelBuffer, Storage};
use tempfile::tempdir;

const PIN: &str = "123456";

fn bin() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("stegkey"))
}

fn write_cover(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    let data = (0..width as usize * height as usize * 4)
        .map(|i| (i * 31 % 251) as u8)
        .collect();
    let pixels = PixelBuffer::new(width, height, data).unwrap();
    Storage::new(path.clone()).save_image(&pixels).unwrap();
    path
}

fn encrypt(dir: &Path, input: &Path, cover: &Path) {
    bin()
        .env("STEGKEY_PIN", PIN)
        .arg("encrypt")
        .arg(input)
        .arg("--cover")
        .arg(cover)
        .arg("--out-dir")
        .arg(dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("secret.txt.key.png"));
}

#[test]
fn encrypt_then_decrypt_roundtrip() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("secret.txt");
    fs::write(&input, b"launch codes").unwrap();
    let cover = write_cover(dir.path(), "cover.png", 32, 32);

    encrypt(dir.path(), &input, &cover);

    let enc = dir.path().join("secret.txt.enc");
    let key = dir.path().join("secret.txt.key.png");
    assert!(enc.exists());
    assert!(key.exists());
    assert_ne!(fs::read(&enc).unwrap(), b"launch codes");

    let out = dir.path().join("restored.txt");
    bin()
        .env("STEGKEY_PIN", PIN)
        .arg("decrypt")
        .arg(&enc)
        .arg("--key-image")
        .arg(&key)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("decrypted file"));

    assert_eq!(fs::read(out).unwrap(), b"launch codes");
}

#[test]
fn decrypt_with_wrong_pin_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("secret.txt");
    fs::write(&input, b"payload").unwrap();
    let cover = write_cover(dir.path(), "cover.png", 20, 20);

    encrypt(dir.path(), &input, &cover);

    let out = dir.path().join("restored.txt");
    bin()
        .env("STEGKEY_PIN", "654321")
        .arg("decrypt")
        .arg(dir.path().join("secret.txt.enc"))
        .arg("--key-image")
        .arg(dir.path().join("secret.txt.key.png"))
        .arg("--out")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("decryption failed"));

    assert!(!out.exists());
}

#[test]
fn decrypt_with_plain_cover_reports_missing_key() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("secret.txt");
    fs::write(&input, b"payload").unwrap();
    let cover = write_cover(dir.path(), "cover.png", 20, 20);

    encrypt(dir.path(), &input, &cover);

    bin()
        .env("STEGKEY_PIN", PIN)
        .arg("decrypt")
        .arg(dir.path().join("secret.txt.enc"))
        .arg("--key-image")
        .arg(&cover)
        .arg("--out")
        .arg(dir.path().join("restored.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no valid embedded key"));
}

#[test]
fn decrypt_refuses_to_overwrite_without_force() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("secret.txt");
    fs::write(&input, b"original").unwrap();
    let cover = write_cover(dir.path(), "cover.png", 20, 20);

    encrypt(dir.path(), &input, &cover);

    // default output strips `.enc` and lands on the original file
    let decrypt = |force: bool| {
        let mut cmd = bin();
        cmd.env("STEGKEY_PIN", PIN)
            .arg("decrypt")
            .arg(dir.path().join("secret.txt.enc"))
            .arg("--key-image")
            .arg(dir.path().join("secret.txt.key.png"));
        if force {
            cmd.arg("--force");
        }
        cmd.assert()
    };

    decrypt(false)
        .failure()
        .stderr(predicate::str::contains("already exists"));

    fs::write(&input, b"clobbered").unwrap();
    decrypt(true).success();
    assert_eq!(fs::read(&input).unwrap(), b"original");
}

#[test]
fn encrypt_refuses_to_replace_existing_outputs_without_force() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("secret.txt");
    fs::write(&input, b"first version").unwrap();
    let cover = write_cover(dir.path(), "cover.png", 20, 20);

    encrypt(dir.path(), &input, &cover);

    let enc = dir.path().join("secret.txt.enc");
    let key = dir.path().join("secret.txt.key.png");
    let old_enc = fs::read(&enc).unwrap();
    let old_key = fs::read(&key).unwrap();

    let encrypt_again = |force: bool| {
        let mut cmd = bin();
        cmd.env("STEGKEY_PIN", PIN)
            .arg("encrypt")
            .arg(&input)
            .arg("--cover")
            .arg(&cover)
            .arg("--out-dir")
            .arg(dir.path());
        if force {
            cmd.arg("--force");
        }
        cmd.assert()
    };

    fs::write(&input, b"second version").unwrap();
    encrypt_again(false)
        .failure()
        .stderr(predicate::str::contains("already exists"));

    // the original pair still decrypts
    assert_eq!(fs::read(&enc).unwrap(), old_enc);
    assert_eq!(fs::read(&key).unwrap(), old_key);
    let out = dir.path().join("first.txt");
    bin()
        .env("STEGKEY_PIN", PIN)
        .arg("decrypt")
        .arg(&enc)
        .arg("--key-image")
        .arg(&key)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();
    assert_eq!(fs::read(&out).unwrap(), b"first version");

    // a lone key image also blocks the run
    fs::remove_file(&enc).unwrap();
    encrypt_again(false)
        .failure()
        .stderr(predicate::str::contains("secret.txt.key.png already exists"));

    encrypt_again(true).success();
    assert_ne!(fs::read(&key).unwrap(), old_key);

    let out = dir.path().join("second.txt");
    bin()
        .env("STEGKEY_PIN", PIN)
        .arg("decrypt")
        .arg(&enc)
        .arg("--key-image")
        .arg(&key)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();
    assert_eq!(fs::read(&out).unwrap(), b"second version");
}

#[test]
fn malformed_pin_is_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("secret.txt");
    fs::write(&input, b"payload").unwrap();
    let cover = write_cover(dir.path(), "cover.png", 20, 20);

    for pin in ["12345", "1234567", "12a456"] {
        bin()
            .env("STEGKEY_PIN", pin)
            .arg("encrypt")
            .arg(&input)
            .arg("--cover")
            .arg(&cover)
            .arg("--out-dir")
            .arg(dir.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid input"));
    }

    assert!(!dir.path().join("secret.txt.enc").exists());
}

#[test]
fn piped_pins_must_match() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("secret.txt");
    fs::write(&input, b"payload").unwrap();
    let cover = write_cover(dir.path(), "cover.png", 20, 20);

    bin()
        .env_remove("STEGKEY_PIN")
        .arg("encrypt")
        .arg(&input)
        .arg("--cover")
        .arg(&cover)
        .arg("--out-dir")
        .arg(dir.path())
        .write_stdin("123456\n654321\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PINs do not match"));

    bin()
        .env_remove("STEGKEY_PIN")
        .arg("encrypt")
        .arg(&input)
        .arg("--cover")
        .arg(&cover)
        .arg("--out-dir")
        .arg(dir.path())
        .write_stdin("123456\n123456\n")
        .assert()
        .success();
}

#[test]
fn cover_below_capacity_is_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("secret.txt");
    fs::write(&input, b"payload").unwrap();
    let cover = write_cover(dir.path(), "tiny.png", 15, 17);

    bin()
        .env("STEGKEY_PIN", PIN)
        .arg("encrypt")
        .arg(&input)
        .arg("--cover")
        .arg(&cover)
        .arg("--out-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("256 pixels required, 255 available"));

    assert!(!dir.path().join("secret.txt.enc").exists());
    assert!(!dir.path().join("secret.txt.key.png").exists());
}

#[test]
fn empty_input_is_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("empty.txt");
    fs::write(&input, b"").unwrap();
    let cover = write_cover(dir.path(), "cover.png", 20, 20);

    bin()
        .env("STEGKEY_PIN", PIN)
        .arg("encrypt")
        .arg(&input)
        .arg("--cover")
        .arg(&cover)
        .arg("--out-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("is empty"));
}

#[test]
fn inspect_reports_embedded_key() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("secret.txt");
    fs::write(&input, b"payload").unwrap();
    let cover = write_cover(dir.path(), "cover.png", 16, 16);

    bin()
        .arg("inspect")
        .arg(&cover)
        .assert()
        .success()
        .stdout(predicate::str::contains("dimensions: 16x16"))
        .stdout(predicate::str::contains("capacity:   96 bytes"))
        .stdout(predicate::str::contains("embedded key: absent"));

    encrypt(dir.path(), &input, &cover);

    bin()
        .arg("inspect")
        .arg(dir.path().join("secret.txt.key.png"))
        .assert()
        .success()
        .stdout(predicate::str::contains("embedded key: present"));
}

#[test]
fn inspect_rejects_non_image() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.png");
    fs::write(&path, b"plain text").unwrap();

    bin()
        .arg("inspect")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to decode image"));
}
