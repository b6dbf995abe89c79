use crate::media::{ImageUpload, MediaError, MediaStore};
use async_trait::async_trait;
use std::sync::Mutex;

/// In-memory media host recording every upload as (file name, folder, bytes)
pub struct FakeMediaStore {
    uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
    fail: bool,
}

impl FakeMediaStore {
    pub fn new() -> Self {
        Self { uploads: Mutex::new(Vec::new()), fail: false }
    }

    pub fn failing() -> Self {
        Self { uploads: Mutex::new(Vec::new()), fail: true }
    }

    pub fn uploads(&self) -> Vec<(String, String, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaStore for FakeMediaStore {
    async fn upload(&self, image: ImageUpload, folder: &str) -> Result<String, MediaError> {
        if self.fail {
            return Err(MediaError::Rejected("upload disabled".to_string()));
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((image.file_name, folder.to_string(), image.bytes));
        Ok(format!("https://media.test/{}/{}.img", folder, uploads.len()))
    }
}
