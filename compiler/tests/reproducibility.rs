// Reproducibility tests for the `hlsc` driver.
//
// These tests run the built binary on checked-in program models and verify
// that identical inputs give byte-identical outputs, that the build-info hash
// depends only on the model's content, and that the exit codes separate
// emission errors (1) from driver errors (2).

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn hlsc_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_hlsc"))
}

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn fixture(name: &str) -> String {
    fixtures_dir().join(name).to_str().unwrap().to_string()
}

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("hlsc-{}-{}", std::process::id(), name))
}

fn run_raw(args: &[&str]) -> Output {
    Command::new(hlsc_binary())
        .args(args)
        .output()
        .expect("failed to run hlsc")
}

fn run_hlsc(args: &[&str]) -> String {
    let output = run_raw(args);
    assert!(
        output.status.success(),
        "hlsc failed with args {:?}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("non-UTF8 output")
}

/// Emitting the same model twice produces byte-identical C++.
#[test]
fn same_model_identical_cpp() {
    let model = fixture("gemv_acc.json");
    let first = run_hlsc(&["--emit", "cpp", &model]);
    let second = run_hlsc(&["--emit", "cpp", &model]);
    assert_eq!(first, second, "C++ output should be byte-identical across runs");
}

/// The emitted nest carries loop pragmas, declarations, and info comments.
#[test]
fn fixture_emits_expected_nest() {
    let cpp = run_hlsc(&["--emit", "cpp", &fixture("gemv_acc.json")]);

    assert!(cpp.starts_with(hlsc::emit::PROLOGUE));
    for expected in [
        "/// This is top function.\n/// Latency=40\nvoid gemv_acc(\n",
        "  float val0[4][4],\n  float val1[4],\n  float val2[4]\n) {\t// L1\n",
        "  #pragma HLS interface m_axi offset=slave port=val2\n",
        "  #pragma HLS array_partition variable=val0 cyclic factor=2 dim=1\n",
        "  for (int val3 = 0; val3 < 4; val3 += 1) {\t// L4\n",
        "    for (int val4 = 0; val4 < 4; val4 += 1) {\t// L5\n      #pragma HLS pipeline II=1\n",
        "      float val5 = val0[val3][val4];\t// L6\n",
        "      float val10 = val9 * 0.5;\t// L11, S[2,4)\n",
        "      val2[val3] = val10;\t// L12\n",
    ] {
        assert!(cpp.contains(expected), "missing {:?} in\n{}", expected, cpp);
    }
}

/// Include paths land in the output in the order given.
#[test]
fn include_paths_follow_prologue() {
    let cpp = run_hlsc(&[
        "--emit",
        "cpp",
        &fixture("gemv_acc.json"),
        "-I",
        "kernels/blas.h",
        "-I",
        "kernels/fft.h",
    ]);
    let first = cpp.find("#include \"kernels/blas.h\"").expect("first include");
    let second = cpp.find("#include \"kernels/fft.h\"").expect("second include");
    assert!(first < second);
    assert!(second < cpp.find("void gemv_acc(").unwrap());
}

/// Writing through `-o` produces the same text as stdout.
#[test]
fn output_file_matches_stdout() {
    let model = fixture("gemv_acc.json");
    let out = scratch_path("gemv_acc.cpp");
    let out_str = out.to_str().unwrap();

    let stdout = run_hlsc(&["--emit", "cpp", &model]);
    let written = run_hlsc(&["--emit", "cpp", &model, "-o", out_str]);
    assert!(written.is_empty());

    let file = std::fs::read_to_string(&out).unwrap();
    let _ = std::fs::remove_file(&out);
    assert_eq!(stdout, file);
}

/// The build-info hash depends on the model's content, not its formatting:
/// the pretty-printed `--emit model` output hashes the same as the fixture.
#[test]
fn build_info_stable_across_formatting() {
    let model = fixture("gemv_acc.json");
    let original = run_hlsc(&["--emit", "build-info", &model]);
    let again = run_hlsc(&["--emit", "build-info", &model]);
    assert_eq!(original, again);

    let reformatted = scratch_path("gemv_acc.model.json");
    let reformatted_str = reformatted.to_str().unwrap();
    run_hlsc(&["--emit", "model", &model, "-o", reformatted_str]);
    let from_reformatted = run_hlsc(&["--emit", "build-info", reformatted_str]);
    let _ = std::fs::remove_file(&reformatted);

    assert_eq!(original, from_reformatted);

    let json: serde_json::Value = serde_json::from_str(&original).unwrap();
    assert_eq!(json["model_hash"].as_str().unwrap().len(), 64);
    assert_eq!(json["functions"], 1);
    assert_eq!(json["compiler_version"], env!("CARGO_PKG_VERSION"));
}

/// `--emit model` output parses back to the same model.
#[test]
fn model_round_trips_through_driver() {
    let model = fixture("gemv_acc.json");
    let first = run_hlsc(&["--emit", "model", &model]);

    let reparsed = scratch_path("gemv_acc.round.json");
    std::fs::write(&reparsed, &first).unwrap();
    let second = run_hlsc(&["--emit", "model", reparsed.to_str().unwrap()]);
    let _ = std::fs::remove_file(&reparsed);

    assert_eq!(first, second);
    let original: hlsc::ir::Module =
        serde_json::from_str(&std::fs::read_to_string(fixtures_dir().join("gemv_acc.json")).unwrap())
            .unwrap();
    let dumped: hlsc::ir::Module = serde_json::from_str(&first).unwrap();
    assert_eq!(original, dumped);
}

/// Emission errors exit with 1, report a coded diagnostic, and write nothing.
#[test]
fn emission_error_exits_one() {
    let output = run_raw(&["--emit", "cpp", &fixture("two_blocks.json")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("E0100"), "stderr: {}", stderr);
    assert!(stderr.contains("no output written"), "stderr: {}", stderr);
}

/// A malformed model is a driver error: exit 2, nothing on stdout.
#[test]
fn malformed_model_exits_two() {
    let output = run_raw(&["--emit", "cpp", &fixture("truncated.json")]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("hlsc: error:"));
}

/// A missing model file is a driver error as well.
#[test]
fn missing_model_exits_two() {
    let missing = fixtures_dir().join("does_not_exist.json");
    let output = run_raw(&["--emit", "cpp", missing.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
}
