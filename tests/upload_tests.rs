
use std::sync::Arc;

use image::GenericImageView;

use partners_points_backend::{
    entities::upload::{UploadFilter, UploadListQuery, UploadType},
    errors::AppError,
    media::{TransformOptions, UploadError, MAX_UPLOAD_BYTES},
    storage::Storage,
    use_cases::upload::{TransformOverrides, UploadHandler, UploadPipeline, UploadRequest},
};
use test_utils::*;

fn png_request(bytes: Vec<u8>, upload_type: UploadType) -> UploadRequest {
    UploadRequest {
        bytes,
        original_name: "storefront.png".into(),
        declared_mime: "image/png".into(),
        upload_type,
        overrides: TransformOverrides::default(),
    }
}

fn pipeline(storage: Arc<dyn Storage>) -> UploadPipeline {
    UploadPipeline::new(storage, TransformOptions::default())
}

#[actix_rt::test]
async fn disallowed_declared_type_writes_nothing() {
    let (memory, storage) = shared_storage();
    let request = UploadRequest {
        declared_mime: "text/plain".into(),
        original_name: "notes.txt".into(),
        ..png_request(b"just some text".to_vec(), UploadType::General)
    };

    let err = pipeline(storage).store(request).await.unwrap_err();

    assert!(matches!(err, UploadError::InvalidFormat(_)));
    assert_eq!(memory.writes(), 0);
}

#[actix_rt::test]
async fn sniffed_content_must_be_an_image() {
    let (memory, storage) = shared_storage();

    let err = pipeline(storage)
        .store(png_request(b"<html>not a png</html>".to_vec(), UploadType::General))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::InvalidFormat(_)));
    assert_eq!(memory.writes(), 0);
}

#[actix_rt::test]
async fn oversized_file_is_rejected() {
    let (memory, storage) = shared_storage();

    let err = pipeline(storage)
        .store(png_request(vec![0u8; MAX_UPLOAD_BYTES + 1], UploadType::General))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::TooLarge { .. }));
    assert_eq!(memory.writes(), 0);
}

#[actix_rt::test]
async fn large_image_is_downscaled_into_the_box() {
    let (memory, storage) = shared_storage();

    let result = pipeline(storage)
        .store(png_request(png_bytes(3000, 1500), UploadType::HeroImage))
        .await
        .unwrap();

    assert_eq!((result.width, result.height), (1920, 960));
    assert_eq!(result.mime_type, "image/png");
    assert!(result.storage_key.starts_with("hero_image/"));
    assert!(result.storage_key.ends_with(".png"));
    assert_eq!(result.url, format!("/uploads/{}", result.storage_key));

    let stored = memory.object(&result.storage_key).expect("object stored");
    assert_eq!(stored.len(), result.size);
    let decoded = image::load_from_memory(&stored).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1920, 960));
}

#[actix_rt::test]
async fn small_image_is_never_upscaled() {
    let (_memory, storage) = shared_storage();

    let result = pipeline(storage)
        .store(png_request(png_bytes(120, 80), UploadType::General))
        .await
        .unwrap();

    assert_eq!((result.width, result.height), (120, 80));
}

#[actix_rt::test]
async fn per_request_overrides_tighten_the_box() {
    let (_memory, storage) = shared_storage();
    let request = UploadRequest {
        overrides: TransformOverrides {
            max_width: Some(400),
            max_height: None,
            quality: Some(70),
        },
        original_name: "menu.jpg".into(),
        declared_mime: "image/jpeg".into(),
        ..png_request(jpeg_bytes(800, 600), UploadType::BlogImage)
    };

    let result = pipeline(storage).store(request).await.unwrap();

    assert_eq!((result.width, result.height), (400, 300));
    assert_eq!(result.mime_type, "image/jpeg");
    assert!(result.storage_key.ends_with(".jpg"));
}

#[actix_rt::test]
async fn oversized_gif_is_resized_to_the_box() {
    let (_memory, storage) = shared_storage();
    let request = UploadRequest {
        original_name: "promo.gif".into(),
        declared_mime: "image/gif".into(),
        ..png_request(gif_bytes(3000, 500), UploadType::HeroImage)
    };

    let result = pipeline(storage.clone()).store(request).await.unwrap();

    assert_eq!((result.width, result.height), (1920, 320));
    assert_eq!(result.mime_type, "image/gif");
    assert!(result.storage_key.ends_with(".gif"));

    let stored = storage.download(&result.storage_key).await.unwrap();
    assert_eq!(image::load_from_memory(&stored).unwrap().dimensions(), (1920, 320));
}

#[actix_rt::test]
async fn webp_upload_is_resized_and_stays_webp() {
    let (_memory, storage) = shared_storage();
    let request = UploadRequest {
        original_name: "interior.webp".into(),
        declared_mime: "image/webp".into(),
        overrides: TransformOverrides {
            max_width: Some(300),
            max_height: Some(300),
            quality: None,
        },
        ..png_request(webp_bytes(600, 200), UploadType::BlogImage)
    };

    let result = pipeline(storage.clone()).store(request).await.unwrap();

    assert_eq!((result.width, result.height), (300, 100));
    assert_eq!(result.mime_type, "image/webp");
    assert!(result.storage_key.ends_with(".webp"));

    let stored = storage.download(&result.storage_key).await.unwrap();
    assert_eq!(image::guess_format(&stored).unwrap(), image::ImageFormat::WebP);
    assert_eq!(result.size, stored.len());
}

#[actix_rt::test]
async fn misnamed_file_gets_the_sniffed_extension() {
    let (_memory, storage) = shared_storage();
    let request = UploadRequest {
        original_name: "photo.png".into(),
        declared_mime: "image/png".into(),
        ..png_request(jpeg_bytes(40, 30), UploadType::General)
    };

    let result = pipeline(storage).store(request).await.unwrap();

    assert_eq!(result.mime_type, "image/jpeg");
    assert!(result.storage_key.ends_with(".jpg"));
    assert_eq!(result.original_name, "photo.png");
}

#[actix_rt::test]
async fn out_of_range_overrides_are_rejected_before_writing() {
    let (memory, storage) = shared_storage();
    let request = UploadRequest {
        overrides: TransformOverrides {
            quality: Some(0),
            ..Default::default()
        },
        ..png_request(png_bytes(10, 10), UploadType::General)
    };

    let err = pipeline(storage).store(request).await.unwrap_err();

    assert!(matches!(err, UploadError::InvalidOptions(_)));
    assert_eq!(memory.writes(), 0);
}

#[actix_rt::test]
async fn client_path_segments_never_reach_the_key() {
    let (_memory, storage) = shared_storage();
    let request = UploadRequest {
        original_name: "../../etc/Logo.PNG".into(),
        ..png_request(png_bytes(10, 10), UploadType::General)
    };

    let result = pipeline(storage).store(request).await.unwrap();

    assert_eq!(result.original_name, "Logo.PNG");
    assert!(result.storage_key.starts_with("general/"));
    assert!(!result.storage_key.contains(".."));
    assert!(result.storage_key.ends_with(".png"));
}

#[actix_rt::test]
async fn stored_bytes_round_trip_through_fetch() {
    let (memory, storage) = shared_storage();
    let uploads = UploadHandler::new(pipeline(storage), InMemoryUploadRepo::new());

    let record = uploads
        .upload(png_request(png_bytes(64, 64), UploadType::FeaturedImage), Some("post-42".into()))
        .await
        .unwrap();

    let (bytes, content_type) = uploads.fetch(&record.storage_key).await.unwrap();
    assert_eq!(Some(bytes), memory.object(&record.storage_key));
    assert_eq!(content_type, "image/png");
    assert_eq!(record.related_id.as_deref(), Some("post-42"));
    assert_eq!(record.upload_type, "featured_image");
}

#[actix_rt::test]
async fn failed_record_insert_leaves_the_object_behind() {
    let (memory, storage) = shared_storage();
    let uploads = UploadHandler::new(pipeline(storage), InMemoryUploadRepo::failing_inserts());

    let err = uploads
        .upload(png_request(png_bytes(16, 16), UploadType::General), None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InternalError(_)));
    assert_eq!(memory.len(), 1);
}

#[actix_rt::test]
async fn delete_removes_record_and_object() {
    let (memory, storage) = shared_storage();
    let uploads = UploadHandler::new(pipeline(storage), InMemoryUploadRepo::new());
    let record = uploads
        .upload(png_request(png_bytes(16, 16), UploadType::General), None)
        .await
        .unwrap();

    let response = uploads.delete(&record.id).await.unwrap();

    assert!(response.storage_deleted);
    assert_eq!(memory.len(), 0);
    assert_eq!(uploads.upload_repo.len(), 0);
    assert!(matches!(uploads.delete(&record.id).await, Err(AppError::NotFound(_))));
}

#[actix_rt::test]
async fn storage_delete_failure_is_reported_not_raised() {
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::failing_deletes());
    let uploads = UploadHandler::new(pipeline(storage), InMemoryUploadRepo::new());
    let record = uploads
        .upload(png_request(png_bytes(16, 16), UploadType::General), None)
        .await
        .unwrap();

    let response = uploads.delete(&record.id).await.unwrap();

    assert!(response.success);
    assert!(!response.storage_deleted);
    assert_eq!(uploads.upload_repo.len(), 0);
}

#[actix_rt::test]
async fn listing_filters_by_upload_type() {
    let (_memory, storage) = shared_storage();
    let uploads = UploadHandler::new(pipeline(storage), InMemoryUploadRepo::new());
    for upload_type in [UploadType::BlogImage, UploadType::BlogImage, UploadType::HeroImage] {
        uploads
            .upload(png_request(png_bytes(8, 8), upload_type), None)
            .await
            .unwrap();
    }

    let filter = UploadFilter::try_from(UploadListQuery {
        upload_type: Some("blog_image".into()),
        ..Default::default()
    })
    .unwrap();
    let listing = uploads.list(&filter).await.unwrap();

    assert_eq!(listing.pagination.total, 2);
    assert!(listing.files.iter().all(|f| f.upload_type == "blog_image"));

    let stats = uploads.stats().await.unwrap();
    assert_eq!(stats.count, 3);
}
