//! gzip 압축기
//!
//! 최대 압축률(level 9)로 gzip 프레임을 만듭니다. 인코더는 성공/실패 어느
//! 경로에서든 반환 전에 소유권이 정리되며, 결과는 `finish()` 이후에만 읽습니다.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::error::LogPipelineError;

/// 페이로드를 최대 압축률 gzip으로 압축합니다.
pub fn gzip(payload: &[u8]) -> Result<Vec<u8>, LogPipelineError> {
    let mut encoder = GzEncoder::new(
        Vec::with_capacity(payload.len() / 4 + 64),
        Compression::best(),
    );
    encoder
        .write_all(payload)
        .map_err(|e| LogPipelineError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| LogPipelineError::Compression(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use flate2::read::GzDecoder;

    fn gunzip(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn round_trip_is_lossless() {
        let payload = b"{\"a\":\"1\"}\n{\"a\":\"2\"}".repeat(50);
        let compressed = gzip(&payload).unwrap();
        assert!(compressed.len() < payload.len());
        assert_eq!(gunzip(&compressed), payload);
    }

    #[test]
    fn output_has_gzip_magic() {
        let compressed = gzip(b"x").unwrap();
        assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn empty_payload_is_valid_gzip() {
        let compressed = gzip(b"").unwrap();
        assert!(!compressed.is_empty());
        assert!(gunzip(&compressed).is_empty());
    }
}
