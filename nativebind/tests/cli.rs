use std::process::Command;

fn nativebind() -> Command {
    Command::new(env!("CARGO_BIN_EXE_nativebind"))
}

#[test]
fn mangle_prints_short_and_long_names() {
    let output = nativebind()
        .args([
            "mangle",
            "com.github.kr328.typedjni.Example",
            "nativeFunction",
            "--descriptor",
            "(IFLjava/lang/String;)V",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Java_com_github_kr328_typedjni_Example_nativeFunction",
            "Java_com_github_kr328_typedjni_Example_nativeFunction__IFLjava_lang_String_2",
        ]
    );
}

#[test]
fn invalid_descriptor_fails() {
    let output = nativebind()
        .args(["mangle", "A", "b", "-d", "(Q)V"])
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[test]
fn missing_library_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = nativebind()
        .args(["run", "--no-system", "--library", "nativebind_no_such_library", "-L"])
        .arg(dir.path())
        .env_remove("NATIVEBIND_LIBRARY_PATH")
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[test]
fn missing_library_dir_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let output = nativebind()
        .args(["locate", "example", "-L"])
        .arg(dir.path().join("missing"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("library directory not found"));
}
