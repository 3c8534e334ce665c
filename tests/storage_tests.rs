use prep_portal::storage::{MockStorageService, S3StorageClient, StorageService};
use uuid::Uuid;

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success() {
        let mock = MockStorageService::new();
        let key = "uploads/listening_part1.mp3";
        let result = mock.get_presigned_upload_url(key, "audio/mpeg").await;
        assert!(result.is_ok());

        let url = result.unwrap();
        assert!(url.contains("signature=fake"));
        assert!(url.contains(key));
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockStorageService::new_failing();
        let result = mock
            .get_presigned_upload_url("uploads/audio.mp3", "audio/mpeg")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_mock_sanitization() {
        // A crafted key must not keep its traversal segments.
        let mock = MockStorageService::new();
        let result = mock
            .get_presigned_upload_url("../../etc/passwd", "text/plain")
            .await;
        assert!(result.is_ok());

        let url = result.unwrap();
        assert!(!url.contains(".."));
    }
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    #[tokio::test]
    async fn test_s3_client_creation() {
        let _client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
        )
        .await;
        // Construction must not panic or require a reachable endpoint.
    }

    #[tokio::test]
    async fn test_s3_presigned_url_format() {
        // Presigning is a local signature computation; no network involved.
        let client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
        )
        .await;

        let key = format!("uploads/{}.mp3", Uuid::new_v4());
        let result = client.get_presigned_upload_url(&key, "audio/mpeg").await;

        assert!(result.is_ok());
        let url = result.unwrap();

        assert!(url.contains("localhost:9000"));
        assert!(url.contains(&key));
    }
}
