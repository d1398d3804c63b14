use std::error::Error;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use onchange::run::{Failure, Outcome, Task, WaitPolicy, process};

type TestResult = Result<(), Box<dyn Error>>;

fn task(name: &str, cmd: &str) -> Task {
    Task {
        name: name.to_string(),
        cmd: cmd.to_string(),
        wait_policy: WaitPolicy::MustComplete,
    }
}

#[tokio::test]
async fn successful_command_reports_succeeded() -> TestResult {
    let (_kill_tx, kill_rx) = oneshot::channel();
    let report = process::run(task("ok", "true"), kill_rx).await;

    assert_eq!(report.task, "ok");
    assert_eq!(report.outcome, Outcome::Succeeded);
    Ok(())
}

#[tokio::test]
async fn nonzero_exit_reports_failed_with_code() -> TestResult {
    let (_kill_tx, kill_rx) = oneshot::channel();
    let report = process::run(task("fail", "sh -c 'exit 3'"), kill_rx).await;

    match report.outcome {
        Outcome::Failed(Failure::Exit(info)) => assert_eq!(info.code, Some(3)),
        other => panic!("expected exit failure, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn missing_executable_reports_launch_failure() -> TestResult {
    let (_kill_tx, kill_rx) = oneshot::channel();
    let report = process::run(
        task("missing", "/definitely/not/a/real/binary --flag"),
        kill_rx,
    )
    .await;

    assert!(matches!(report.outcome, Outcome::Failed(Failure::Io(_))));
    Ok(())
}

#[tokio::test]
async fn empty_command_line_reports_launch_failure() -> TestResult {
    let (_kill_tx, kill_rx) = oneshot::channel();
    let report = process::run(task("empty", "   "), kill_rx).await;

    assert!(matches!(report.outcome, Outcome::Failed(Failure::Io(_))));
    Ok(())
}

#[tokio::test]
async fn kill_signal_terminates_running_process() -> TestResult {
    let (kill_tx, kill_rx) = oneshot::channel();
    let started = Instant::now();

    let runner = tokio::spawn(process::run(task("sleeper", "sleep 5"), kill_rx));
    tokio::time::sleep(Duration::from_millis(100)).await;
    kill_tx.send(()).expect("runner should still be listening");

    let report = runner.await?;
    assert_eq!(report.outcome, Outcome::Killed);
    assert!(
        started.elapsed() < Duration::from_secs(4),
        "killed task should not run to natural completion"
    );
    Ok(())
}

#[tokio::test]
async fn stale_kill_after_exit_is_a_noop() -> TestResult {
    let (kill_tx, kill_rx) = oneshot::channel();
    let report = process::run(task("quick", "true"), kill_rx).await;
    assert_eq!(report.outcome, Outcome::Succeeded);

    // The runner is gone; a late kill finds a closed channel instead of a
    // process, and the recorded outcome stays what it was.
    assert!(kill_tx.send(()).is_err());
    assert_eq!(report.outcome, Outcome::Succeeded);
    Ok(())
}

#[tokio::test]
async fn dropped_kill_half_lets_process_finish() -> TestResult {
    let (kill_tx, kill_rx) = oneshot::channel::<()>();
    drop(kill_tx);

    let report = process::run(task("echoer", "echo done"), kill_rx).await;
    assert_eq!(report.outcome, Outcome::Succeeded);
    Ok(())
}

#[tokio::test]
async fn pump_preserves_line_order_within_a_stream() -> TestResult {
    let input: &[u8] = b"a\nb\n";
    let mut seen = Vec::new();

    process::pump_lines(input, |line| seen.push(line.to_string())).await;

    assert_eq!(seen, vec!["a".to_string(), "b".to_string()]);
    Ok(())
}
