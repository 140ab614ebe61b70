//! Integration tests for the update pipeline with a scripted FakeRunner.

use clang_update_core::fakes::FakeRunner;
use clang_update_core::{
    BuildDefines, ClangUpdater, CommandOutcome, CommandSpec, PathLayout, SkipReason, StampFile,
    ToolchainEnv, UpdateError, UpdateOutcome, UpdateSettings,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// Stand-in for what svn and ninja leave on disk.
fn simulate(layout: &PathLayout, spec: &CommandSpec) {
    match spec.program.as_str() {
        "svn" => {
            let dir = PathBuf::from(spec.args.last().expect("checkout destination"));
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("CMakeLists.txt"), "project(x)").unwrap();
        }
        "ninja" if spec.args == ["all"] => {
            let headers = layout.sanitizer_include_dir();
            fs::create_dir_all(&headers).unwrap();
            fs::write(headers.join("asan_interface.h"), "// asan").unwrap();
            fs::write(headers.join("lsan_interface.h"), "// lsan").unwrap();
        }
        "ninja" => {
            let libs = layout.asan_rt_lib_src_dir();
            fs::create_dir_all(&libs).unwrap();
            for name in [
                "clang_rt.asan-i386.lib",
                "clang_rt.asan_dynamic-i386.dll",
                "clang_rt.asan_dynamic-i386.pdb",
                "clang_rt.builtins-x86_64.lib",
            ] {
                fs::write(libs.join(name), name).unwrap();
            }
            fs::write(
                PathLayout::clang_lib_dir(&layout.compiler_rt_build_dir).join("asan_blacklist.txt"),
                "fun:*",
            )
            .unwrap();
        }
        _ => {}
    }
}

fn asan_settings(root: &Path) -> UpdateSettings {
    UpdateSettings::new(root, BuildDefines::new("asan=1 component=static_library"))
}

fn updater(settings: UpdateSettings, runner: Arc<FakeRunner>) -> ClangUpdater {
    ClangUpdater::new(settings, runner, Arc::new(ToolchainEnv::default()))
}

/// Test: stamp matches the pinned revision, nothing is touched
#[tokio::test]
async fn test_up_to_date_stamp_skips_everything() {
    let dir = tempdir().unwrap();
    let layout = PathLayout::new(dir.path());
    let stamp = StampFile::new(&layout.stamp_file);
    stamp.write("232554").unwrap();
    fs::create_dir_all(&layout.out_dir).unwrap();
    fs::write(layout.out_dir.join("build.ninja"), "keep").unwrap();

    let runner = Arc::new(FakeRunner::succeeding());
    let outcome = updater(asan_settings(dir.path()), runner.clone())
        .run()
        .await
        .expect("update failed");

    assert_eq!(
        outcome,
        UpdateOutcome::Skipped {
            reason: SkipReason::UpToDate {
                revision: "232554".to_string()
            }
        }
    );
    assert_eq!(runner.call_count(), 0, "No commands should run");
    assert_eq!(stamp.read(), "232554");
    assert!(layout.out_dir.join("build.ninja").is_file(), "out/ must survive");
}

/// Test: no clang flag, no children, no writes
#[tokio::test]
async fn test_missing_clang_flag_is_a_no_op() {
    let dir = tempdir().unwrap();
    let runner = Arc::new(FakeRunner::succeeding());
    let settings = UpdateSettings::new(dir.path(), BuildDefines::new("component=shared_library"));

    let outcome = updater(settings, runner.clone()).run().await.unwrap();

    assert!(outcome.is_skipped());
    assert_eq!(runner.call_count(), 0);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0, "Nothing written");
}

/// Test: prebuilt toolchain requested, nothing to do
#[tokio::test]
async fn test_prebuilt_clang_dir_is_a_no_op() {
    let dir = tempdir().unwrap();
    let runner = Arc::new(FakeRunner::succeeding());
    let settings = UpdateSettings::new(dir.path(), BuildDefines::new("clang=1 make_clang_dir=/opt/llvm"));

    let outcome = updater(settings, runner.clone()).run().await.unwrap();

    assert_eq!(
        outcome,
        UpdateOutcome::Skipped {
            reason: SkipReason::PrebuiltClangDir
        }
    );
    assert_eq!(runner.call_count(), 0);
}

/// Test: stale stamp, every tool succeeds
#[tokio::test]
async fn test_full_update_stages_artifacts_and_commits_stamp() {
    let dir = tempdir().unwrap();
    let layout = PathLayout::new(dir.path());
    let stamp = StampFile::new(&layout.stamp_file);
    stamp.write("100").unwrap();
    fs::create_dir_all(layout.out_dir.join("Release")).unwrap();

    let sim_layout = layout.clone();
    let runner = Arc::new(FakeRunner::with_responder(move |spec| {
        simulate(&sim_layout, spec);
        CommandOutcome::success()
    }));

    let outcome = updater(asan_settings(dir.path()), runner.clone())
        .run()
        .await
        .expect("update failed");

    match outcome {
        UpdateOutcome::Updated {
            revision,
            staged_files,
            ..
        } => {
            assert_eq!(revision.as_str(), "232554");
            // 2 runtimes + blacklist + 2 headers
            assert_eq!(staged_files, 5);
        }
        other => panic!("expected an update, got {other:?}"),
    }

    assert_eq!(stamp.read(), "232554");
    assert!(!layout.out_dir.exists(), "out/ should be clobbered");

    assert_eq!(
        runner.programs(),
        ["svn", "svn", "svn", "svn", "cmake", "ninja", "cmake", "ninja"]
    );
    let calls = runner.calls();
    assert!(calls[0].args[2].ends_with("/llvm/trunk@232554"));
    assert!(calls[1].args[2].ends_with("/cfe/trunk@232554"));
    assert!(calls[2].args[2].ends_with("/lld/trunk@232554"));
    assert!(calls[3].args[2].ends_with("/compiler-rt/trunk@232554"));
    assert_eq!(calls[5].args, ["all"]);
    assert_eq!(calls[7].args, ["compiler-rt"]);

    let dst = layout.asan_rt_lib_dst_dir();
    let mut staged: Vec<String> = fs::read_dir(&dst)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    staged.sort();
    assert_eq!(
        staged,
        ["clang_rt.asan-i386.lib", "clang_rt.asan_dynamic-i386.dll"]
    );
    assert!(PathLayout::clang_lib_dir(&layout.llvm_build_dir)
        .join("asan_blacklist.txt")
        .is_file());
    assert!(layout
        .aux_sanitizer_include_dir()
        .join("lsan_interface.h")
        .is_file());
}

/// Test: the stamp is blank by the time the first checkout starts
#[tokio::test]
async fn test_stamp_cleared_before_fetch() {
    let dir = tempdir().unwrap();
    let layout = PathLayout::new(dir.path());
    StampFile::new(&layout.stamp_file).write("100").unwrap();
    fs::create_dir_all(&layout.out_dir).unwrap();

    let observed: Arc<Mutex<Option<(String, bool)>>> = Arc::new(Mutex::new(None));
    let seen = observed.clone();
    let stamp_path = layout.stamp_file.clone();
    let out_dir = layout.out_dir.clone();
    let runner = Arc::new(FakeRunner::with_responder(move |spec| {
        let mut seen = seen.lock().unwrap();
        if spec.program == "svn" && seen.is_none() {
            let contents = fs::read_to_string(&stamp_path).unwrap();
            *seen = Some((contents, out_dir.exists()));
        }
        // Abort the run right after the first checkout.
        CommandOutcome::failure(1)
    }));

    let result = updater(asan_settings(dir.path()), runner).run().await;
    assert!(result.is_err());

    let (contents, out_exists) = observed.lock().unwrap().clone().expect("svn was called");
    assert_eq!(contents, "", "Stamp must be empty before fetch");
    assert!(!out_exists, "Clobber must happen before fetch");
    assert_eq!(StampFile::new(&layout.stamp_file).read(), "");
}

/// Test: a broken working copy is removed and the checkout retried
#[tokio::test]
async fn test_checkout_retry_after_removing_stale_copy() {
    let dir = tempdir().unwrap();
    let layout = PathLayout::new(dir.path());
    fs::create_dir_all(layout.llvm_dir.join(".svn")).unwrap();
    fs::write(layout.llvm_dir.join(".svn").join("wc.db"), "corrupt").unwrap();

    let svn_calls = Arc::new(AtomicUsize::new(0));
    let counter = svn_calls.clone();
    let sim_layout = layout.clone();
    let runner = Arc::new(FakeRunner::with_responder(move |spec| {
        if spec.program == "svn" && counter.fetch_add(1, Ordering::SeqCst) == 0 {
            return CommandOutcome::failure(1);
        }
        simulate(&sim_layout, spec);
        CommandOutcome::success()
    }));

    updater(asan_settings(dir.path()), runner.clone())
        .run()
        .await
        .expect("retry should recover");

    assert_eq!(svn_calls.load(Ordering::SeqCst), 5, "LLVM checked out twice");
    let calls = runner.calls();
    assert_eq!(calls[0], calls[1], "Retry uses the same command");
    assert!(!layout.llvm_dir.join(".svn").exists(), "Stale copy removed");
    assert!(layout.llvm_dir.join("CMakeLists.txt").is_file());
    assert_eq!(StampFile::new(&layout.stamp_file).read(), "232554");
}

/// Test: two consecutive checkout failures are fatal
#[tokio::test]
async fn test_second_checkout_failure_is_fatal() {
    let dir = tempdir().unwrap();
    let layout = PathLayout::new(dir.path());
    StampFile::new(&layout.stamp_file).write("100").unwrap();

    let runner = Arc::new(FakeRunner::with_responder(|spec| {
        if spec.program == "svn" {
            // Leave a partial working copy behind, then fail.
            let dir = PathBuf::from(spec.args.last().unwrap());
            fs::create_dir_all(dir.join(".svn")).unwrap();
            return CommandOutcome::failure(1);
        }
        CommandOutcome::success()
    }));

    let err = updater(asan_settings(dir.path()), runner.clone())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, UpdateError::CommandFailed { code: 1, .. }));
    assert_ne!(err.exit_code(), 0);
    assert_eq!(runner.programs(), ["svn", "svn"], "Nothing runs after the fatal checkout");
    assert_eq!(StampFile::new(&layout.stamp_file).read(), "");
}

/// Test: a failing build leaves the stamp blank and propagates the exit code
#[tokio::test]
async fn test_build_failure_keeps_stamp_cleared() {
    let dir = tempdir().unwrap();
    let layout = PathLayout::new(dir.path());
    StampFile::new(&layout.stamp_file).write("100").unwrap();

    let sim_layout = layout.clone();
    let runner = Arc::new(FakeRunner::with_responder(move |spec| {
        if spec.program == "ninja" {
            return CommandOutcome::failure(2);
        }
        simulate(&sim_layout, spec);
        CommandOutcome::success()
    }));

    let err = updater(asan_settings(dir.path()), runner.clone())
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.exit_code(), 2);
    assert_eq!(runner.programs().last().map(String::as_str), Some("ninja"));
    assert_eq!(runner.call_count(), 6, "Stops at the first ninja");
    assert_eq!(StampFile::new(&layout.stamp_file).read(), "");
}

/// Test: HEAD is always refetched, even when the stamp says HEAD
#[tokio::test]
async fn test_head_revision_always_updates() {
    let dir = tempdir().unwrap();
    let layout = PathLayout::new(dir.path());
    StampFile::new(&layout.stamp_file).write("HEAD").unwrap();

    let sim_layout = layout.clone();
    let runner = Arc::new(FakeRunner::with_responder(move |spec| {
        simulate(&sim_layout, spec);
        CommandOutcome::success()
    }));

    let settings = UpdateSettings::new(dir.path(), BuildDefines::new("clang=1"))
        .with_repo_url("https://mirror.example.org/llvm-project");
    let outcome = updater(settings, runner.clone()).run().await.unwrap();

    assert!(!outcome.is_skipped());
    assert_eq!(runner.call_count(), 8);
    assert_eq!(
        runner.calls()[0].args[2],
        "https://mirror.example.org/llvm-project/llvm/trunk@HEAD"
    );
    assert_eq!(StampFile::new(&layout.stamp_file).read(), "HEAD");
}
