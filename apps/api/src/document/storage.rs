use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::document::{DocumentError, DocumentStore, UploadedDocument, UploadedFile};

/// S3 (or MinIO) document storage.
#[derive(Clone)]
pub struct S3DocumentStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3DocumentStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Builds `YYYYMMDD/<owner>/<uuid>[.<ext>]` so each owner's uploads are grouped per day
/// and never collide.
fn file_key_for(file: &UploadedFile, owner_id: Uuid, date: NaiveDate) -> String {
    let storage_name = match file.extension() {
        Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
        None => Uuid::new_v4().to_string(),
    };
    format!("{}/{owner_id}/{storage_name}", date.format("%Y%m%d"))
}

#[async_trait]
impl DocumentStore for S3DocumentStore {
    async fn upload(
        &self,
        file: &UploadedFile,
        owner_id: Uuid,
    ) -> Result<UploadedDocument, DocumentError> {
        let file_key = file_key_for(file, owner_id, Utc::now().date_naive());
        let file_url = format!("{}/{}", self.public_base_url, file_key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&file_key)
            .body(ByteStream::from(file.bytes.clone()))
            .content_type(&file.content_type)
            .send()
            .await
            .map_err(|e| DocumentError::Unavailable(format!("S3 upload failed: {e}")))?;

        info!("Uploaded document to s3://{}/{}", self.bucket, file_key);

        let file_storage_name = file_key
            .rsplit('/')
            .next()
            .unwrap_or(&file_key)
            .to_string();

        Ok(UploadedDocument {
            file_storage_name,
            file_key,
            file_url,
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            file_size: file.bytes.len() as u64,
        })
    }

    async fn download(&self, file_key: &str) -> Result<Bytes, DocumentError> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(file_key)
            .send()
            .await
            .map_err(|e| DocumentError::Unavailable(format!("S3 download failed: {e}")))?;

        let body = object
            .body
            .collect()
            .await
            .map_err(|e| DocumentError::Unavailable(format!("S3 body read failed: {e}")))?;

        Ok(body.into_bytes())
    }
}
