use crate::*;
use stowage::error::{ErrorKind, Result};
use stowage::storage::TransferOutcome;
use stowage::storage::constants::MAX_UPLOAD_SIZE;

pub fn tests(client: &TestClient, tests: &mut Vec<Trial>) {
    tests.extend(async_trials!(
        client,
        test_upload_file_records_remote_copy,
        test_upload_file_uses_remote_name,
        test_upload_missing_file_never_calls_gateway,
        test_upload_oversized_file_is_skipped,
        test_upload_at_limit_is_attempted,
        test_upload_remote_size_rejection_is_a_failure
    ));
}

async fn test_upload_file_records_remote_copy(client: TestClient) -> Result<()> {
    let dir = TEST_FIXTURE.new_dir();
    let (path, content) = TEST_FIXTURE.new_file_with_range(&dir, "report.pdf", 1..4096);

    let outcome = client.upload_file(&path, None).await;
    let TransferOutcome::Succeeded { remote_id, .. } = &outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert!(outcome.message().starts_with("Uploaded"));

    let info = client.file_info(remote_id).await?.expect("uploaded file exists");
    assert_eq!(info.name, "report.pdf");
    assert_eq!(info.size, content.len() as u64);
    Ok(())
}

async fn test_upload_file_uses_remote_name(client: TestClient) -> Result<()> {
    let dir = TEST_FIXTURE.new_dir();
    let (path, _) = TEST_FIXTURE.new_file_with_range(&dir, "local.txt", 1..64);

    let outcome = client.upload_file(&path, Some("renamed.txt")).await;
    let TransferOutcome::Succeeded { remote_id, .. } = outcome else {
        panic!("expected success");
    };
    let info = client.file_info(&remote_id).await?.expect("uploaded file exists");
    assert_eq!(info.name, "renamed.txt");
    Ok(())
}

async fn test_upload_missing_file_never_calls_gateway(_client: TestClient) -> Result<()> {
    let client = fresh_client();
    let dir = TEST_FIXTURE.new_dir();
    let missing = TEST_FIXTURE.missing_path(&dir);

    let outcome = client.upload_file(&missing, None).await;
    assert!(matches!(outcome, TransferOutcome::Failed { .. }));
    assert_eq!(outcome.kind(), Some(ErrorKind::NotFound));
    assert_eq!(outcome.message(), "File not found");
    assert_eq!(client.gateway().upload_calls(), 0);
    Ok(())
}

async fn test_upload_oversized_file_is_skipped(_client: TestClient) -> Result<()> {
    let client = fresh_client();
    let dir = TEST_FIXTURE.new_dir();
    let path = TEST_FIXTURE.new_sized_file(&dir, "huge.mov", MAX_UPLOAD_SIZE + 1);

    let outcome = client.upload_file(&path, None).await;
    assert!(matches!(outcome, TransferOutcome::Skipped { .. }));
    assert!(outcome.message().contains("40.0MB"), "{}", outcome.message());
    assert_eq!(client.gateway().upload_calls(), 0);
    Ok(())
}

async fn test_upload_at_limit_is_attempted(_client: TestClient) -> Result<()> {
    let client = fresh_client();
    let dir = TEST_FIXTURE.new_dir();
    let path = TEST_FIXTURE.new_sized_file(&dir, "exact.bin", MAX_UPLOAD_SIZE);

    let outcome = client.upload_file(&path, None).await;
    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(client.gateway().upload_calls(), 1);
    Ok(())
}

async fn test_upload_remote_size_rejection_is_a_failure(_client: TestClient) -> Result<()> {
    let client = fresh_client();
    client.gateway().fail_uploads_named("small.txt", 413);
    let dir = TEST_FIXTURE.new_dir();
    let (path, _) = TEST_FIXTURE.new_file_with_range(&dir, "small.txt", 1..64);

    let outcome = client.upload_file(&path, None).await;
    assert!(matches!(outcome, TransferOutcome::Failed { .. }));
    assert_eq!(outcome.kind(), Some(ErrorKind::PayloadTooLarge));
    assert!(outcome.message().contains("40MB"));
    assert_eq!(client.gateway().upload_calls(), 1);
    Ok(())
}
