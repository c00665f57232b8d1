use crate::models::document::DocumentFile;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 读取单个文件，按扩展名推断声明的 MIME 类型
pub async fn load_document_file(path: &Path) -> Result<DocumentFile> {
    let content = fs::read(path)
        .await
        .with_context(|| format!("无法读取文件: {}", path.display()))?;

    let file_name = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let mime_type = mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string());

    Ok(DocumentFile {
        file_name,
        mime_type,
        content,
    })
}

/// 读取文件夹中的所有文件（不递归），按文件名排序
///
/// 这里不做类型过滤：不支持的文件交给上传编排器，生成失败任务给用户看
pub async fn load_documents_from_folder(folder_path: &str) -> Result<Vec<DocumentFile>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        match load_document_file(&path).await {
            Ok(document) => {
                tracing::debug!(
                    "已读取: {} ({} 字节)",
                    document.file_name,
                    document.content.len()
                );
                documents.push(document);
            }
            Err(e) => {
                tracing::warn!("读取文件失败 {}: {}", path.display(), e);
            }
        }
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_folder_sorted_with_mime_types() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_notes.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("a_guide.md"), "# Guide").unwrap();
        std::fs::write(dir.path().join("c_scan.png"), [0u8, 1, 2]).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let docs = load_documents_from_folder(dir.path().to_str().unwrap())
            .await
            .unwrap();

        let names: Vec<&str> = docs.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["a_guide.md", "b_notes.txt", "c_scan.png"]);
        assert_eq!(docs[1].mime_type.as_deref(), Some("text/plain"));
        assert_eq!(docs[2].mime_type.as_deref(), Some("image/png"));
        assert_eq!(docs[1].content, b"hello");
    }

    #[tokio::test]
    async fn test_missing_folder_is_an_error() {
        let result = load_documents_from_folder("/definitely/not/here").await;
        assert!(result.is_err());
    }
}
