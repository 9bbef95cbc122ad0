use super::artifacts::ImagePayload;
use super::errors::InputError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bevy::prelude::*;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

const FALLBACK_MIME: &str = "application/octet-stream";

/// A file as delivered by the host page or the native window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub declared_mime: Option<String>,
}

/// Preview representation of the selected image for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePreview {
    pub name: String,
    pub data_url: String,
    /// `None` when the bytes are not a format the viewer can decode.
    pub dimensions: Option<(u32, u32)>,
}

/// Result of a successful selection: the payload for the controller and its preview.
#[derive(Debug, Clone)]
pub struct ImageSelection {
    pub payload: ImagePayload,
    pub preview: ImagePreview,
}

/// Most recent preview, for overlays and host notifications.
#[derive(Resource, Debug, Default)]
pub struct ImagePreviewState {
    pub current: Option<ImagePreview>,
}

/// Turn a raw selection into an image payload and its preview.
/// Empty selections are rejected without touching pipeline state.
pub fn on_file_selected(file: Option<SelectedFile>) -> Result<ImageSelection, InputError> {
    let file = file.ok_or(InputError::NoFile)?;
    if file.bytes.is_empty() {
        return Err(InputError::EmptyFile(file.name));
    }

    let mime_type = file
        .declared_mime
        .filter(|mime| !mime.trim().is_empty())
        .or_else(|| sniff_mime(&file.bytes))
        .unwrap_or_else(|| FALLBACK_MIME.to_string());

    let preview = ImagePreview {
        name: file.name.clone(),
        data_url: format!("data:{};base64,{}", mime_type, STANDARD.encode(&file.bytes)),
        dimensions: decode_dimensions(&file.bytes),
    };

    Ok(ImageSelection {
        payload: ImagePayload {
            name: file.name,
            mime_type,
            bytes: file.bytes,
        },
        preview,
    })
}

/// Read a dropped or configured file from disk.
pub fn read_selected_file(path: &Path) -> Result<SelectedFile, InputError> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = std::fs::read(path).map_err(|e| InputError::Unreadable {
        name: name.clone(),
        reason: e.to_string(),
    })?;

    let declared_mime = ImageFormat::from_path(path)
        .ok()
        .map(|format| format.to_mime_type().to_string());

    Ok(SelectedFile {
        name,
        bytes,
        declared_mime,
    })
}

fn sniff_mime(bytes: &[u8]) -> Option<String> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type().to_string())
}

fn decode_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = ImageBuffer::from_pixel(width, height, Rgb([200u8, 40, 40]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn rejects_missing_and_empty_selections() {
        assert_eq!(on_file_selected(None).unwrap_err(), InputError::NoFile);

        let empty = SelectedFile {
            name: "photo.png".to_string(),
            bytes: Vec::new(),
            declared_mime: Some("image/png".to_string()),
        };
        assert_eq!(
            on_file_selected(Some(empty)).unwrap_err(),
            InputError::EmptyFile("photo.png".to_string())
        );
    }

    #[test]
    fn sniffs_mime_and_dimensions_when_undeclared() {
        let selection = on_file_selected(Some(SelectedFile {
            name: "photo.png".to_string(),
            bytes: png_bytes(4, 3),
            declared_mime: None,
        }))
        .unwrap();

        assert_eq!(selection.payload.mime_type, "image/png");
        assert_eq!(selection.preview.dimensions, Some((4, 3)));
        assert!(selection.preview.data_url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn unknown_bytes_still_produce_a_payload() {
        let selection = on_file_selected(Some(SelectedFile {
            name: "scan.raw".to_string(),
            bytes: vec![1, 2, 3, 4],
            declared_mime: Some(" ".to_string()),
        }))
        .unwrap();

        assert_eq!(selection.payload.mime_type, FALLBACK_MIME);
        assert_eq!(selection.preview.dimensions, None);
        assert_eq!(selection.payload.bytes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn unreadable_paths_report_the_file_name() {
        let error = read_selected_file(Path::new("/definitely/missing/photo.png")).unwrap_err();
        assert!(matches!(error, InputError::Unreadable { ref name, .. } if name == "photo.png"));
    }
}
