use std::path::Path;

use tracing::warn;

use crate::error::PgxError;

pub const VCF_EXTENSION: &str = "vcf";
pub const MAX_VCF_BYTES: u64 = 5 * 1024 * 1024;

fn rejected(path: &Path, reason: String) -> PgxError {
    PgxError::FileRejected {
        path: path.display().to_string(),
        reason,
    }
}

/// Gate checks run before parsing: extension and size.
pub fn validate_vcf_file(path: &Path, size_bytes: u64) -> Result<(), PgxError> {
    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(VCF_EXTENSION));
    if !has_extension {
        return Err(rejected(path, "File must have a .vcf extension.".into()));
    }

    if size_bytes > MAX_VCF_BYTES {
        let mb = size_bytes as f64 / 1024.0 / 1024.0;
        return Err(rejected(
            path,
            format!("File exceeds maximum size of 5 MB ({mb:.1} MB)."),
        ));
    }

    Ok(())
}

pub async fn read_vcf_file(path: &Path) -> Result<String, PgxError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|err| rejected(path, format!("Unable to read file: {err}")))?;
    validate_vcf_file(path, metadata.len())?;

    let bytes = tokio::fs::read(path).await?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            warn!(
                path = %path.display(),
                "File is not valid UTF-8; invalid bytes replaced"
            );
            Ok(String::from_utf8_lossy(err.as_bytes()).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        std::env::temp_dir().join(format!("pgxrisk-{}-{nanos}-{name}", std::process::id()))
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(validate_vcf_file(Path::new("patient.VCF"), 10).is_ok());
        let err = validate_vcf_file(Path::new("patient.txt"), 10).expect_err("bad extension");
        assert!(err.to_string().contains(".vcf extension"));
        assert!(validate_vcf_file(Path::new("patient"), 10).is_err());
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(validate_vcf_file(Path::new("a.vcf"), MAX_VCF_BYTES).is_ok());
        let err = validate_vcf_file(Path::new("a.vcf"), MAX_VCF_BYTES + 1).expect_err("too big");
        assert!(err.to_string().contains("maximum size of 5 MB"));
    }

    #[tokio::test]
    async fn read_vcf_file_returns_text() {
        let path = temp_path("ok.vcf");
        std::fs::write(&path, "##fileformat=VCFv4.2\n").expect("write");
        let text = read_vcf_file(&path).await.expect("read");
        assert!(text.starts_with("##fileformat"));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn read_vcf_file_decodes_invalid_utf8_lossily() {
        let path = temp_path("latin1.vcf");
        let mut bytes = b"##fileformat=VCFv4.2\n##source=Lab M".to_vec();
        bytes.push(0xfc);
        bytes.extend_from_slice(
            b"nchen\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
              chr22\t1\trs1\tC\tT\t100\tPASS\tGENE=CYP2D6;STAR=*4\n",
        );
        std::fs::write(&path, &bytes).expect("write");

        let text = read_vcf_file(&path).await.expect("lossy read");
        let _ = std::fs::remove_file(&path);

        assert!(text.contains("Lab M\u{FFFD}nchen"));
        let parsed = crate::transform::vcf::parse_vcf(&text);
        assert!(parsed.is_valid);
        assert_eq!(parsed.records.len(), 1);
    }

    #[tokio::test]
    async fn read_vcf_file_rejects_missing_file() {
        let err = read_vcf_file(&temp_path("missing.vcf"))
            .await
            .expect_err("missing file");
        assert!(matches!(err, PgxError::FileRejected { .. }));
    }
}
