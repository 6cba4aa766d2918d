use std::process::Command;

fn run(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_orbital-defence"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch orbital-defence binary");
    assert!(output.status.success(), "runner exited with {:?}", output.status);
    String::from_utf8(output.stdout).expect("summary is utf-8")
}

#[test]
fn short_run_prints_a_summary() {
    let stdout = run(&["--seed", "4", "--frames", "120"]);

    assert!(stdout.contains("wave:    1"));
    assert!(stdout.contains("credits:"));
    assert!(stdout.contains("First Blood"));
}

#[test]
fn same_seed_prints_the_same_summary() {
    let args = ["--seed", "21", "--frames", "2000", "--auto-place"];
    assert_eq!(run(&args), run(&args));
}

#[test]
fn out_of_range_speed_is_reported() {
    let output = Command::new(env!("CARGO_BIN_EXE_orbital-defence"))
        .args(["--speed", "9", "--frames", "1"])
        .output()
        .expect("failed to launch orbital-defence binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid --speed value"));
}

#[test]
fn save_file_is_written_and_resumed() {
    let dir = std::env::temp_dir().join(format!("orbital-defence-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let save = dir.join("session.save");
    let achievements = dir.join("achievements.dat");
    let save_arg = save.to_string_lossy().into_owned();
    let achievements_arg = achievements.to_string_lossy().into_owned();
    let args = [
        "--seed",
        "5",
        "--frames",
        "600",
        "--auto-place",
        "--save",
        save_arg.as_str(),
        "--achievements",
        achievements_arg.as_str(),
    ];

    let _ = run(&args);
    let first = std::fs::read_to_string(&save).expect("save written");
    assert!(first.starts_with("odc:v1:"));

    let resumed = run(&args);
    assert!(resumed.contains("wave:"));
    let second = std::fs::read_to_string(&save).expect("save rewritten");
    assert!(second.starts_with("odc:v1:"));

    std::fs::remove_dir_all(&dir).expect("temp dir removed");
}
