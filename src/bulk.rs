use std::sync::Arc;

use anyhow::Result;
use log::warn;
use tokio::task::spawn_blocking;

use crate::archive::ArchiveEntry;
use crate::encoding::FaceDescriptor;
use crate::extractor::FaceExtractor;

/// 每张图片只取第一张人脸，没有检测到人脸的图片直接跳过
pub fn select_registrations<I>(images: I) -> Vec<(String, FaceDescriptor)>
where
    I: IntoIterator<Item = (String, Vec<FaceDescriptor>)>,
{
    images
        .into_iter()
        .filter_map(|(filename, descriptors)| match descriptors.into_iter().next() {
            Some(descriptor) => Some((filename, descriptor)),
            None => {
                warn!("未检测到人脸，跳过: {filename}");
                None
            }
        })
        .collect()
}

/// 依次提取每个文件中的人脸特征，每处理完一个文件调用一次 `on_extracted`
///
/// 任意一张图片提取失败都会中止整个批次。
pub async fn extract_entries<F>(
    extractor: Arc<dyn FaceExtractor>,
    entries: Vec<ArchiveEntry>,
    mut on_extracted: F,
) -> Result<Vec<(String, Vec<FaceDescriptor>)>>
where
    F: FnMut(&str) + Send,
{
    let mut images = Vec::with_capacity(entries.len());
    for entry in entries {
        let extractor = extractor.clone();
        let ArchiveEntry { name, data } = entry;
        let descriptors = spawn_blocking(move || extractor.extract(&data)).await??;
        on_extracted(&name);
        images.push((name, descriptors));
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::DESCRIPTOR_DIM;

    fn face(v: f64) -> FaceDescriptor {
        FaceDescriptor::try_from(vec![v; DESCRIPTOR_DIM]).unwrap()
    }

    #[test]
    fn test_select_skips_images_without_face() {
        let images = vec![
            ("1.jpg".to_owned(), vec![face(1.)]),
            ("2.jpg".to_owned(), vec![]),
            ("3.jpg".to_owned(), vec![face(3.)]),
        ];
        let selected = select_registrations(images);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].0, "1.jpg");
        assert_eq!(selected[1].0, "3.jpg");
    }

    #[test]
    fn test_select_takes_first_face() {
        let images = vec![("group.jpg".to_owned(), vec![face(1.), face(2.)])];
        let selected = select_registrations(images);
        assert_eq!(selected, vec![("group.jpg".to_owned(), face(1.))]);
    }

    struct FixedExtractor;

    impl FaceExtractor for FixedExtractor {
        fn extract(&self, image: &[u8]) -> Result<Vec<FaceDescriptor>> {
            Ok(image.iter().map(|&b| face(b as f64)).collect())
        }
    }

    #[tokio::test]
    async fn test_extract_entries_reports_progress() {
        let entries = vec![
            ArchiveEntry { name: "a.jpg".to_owned(), data: vec![1] },
            ArchiveEntry { name: "b.jpg".to_owned(), data: vec![] },
            ArchiveEntry { name: "c.jpg".to_owned(), data: vec![3, 4] },
        ];
        let mut seen = vec![];
        let images = extract_entries(Arc::new(FixedExtractor), entries, |name| seen.push(name.to_owned()))
            .await
            .unwrap();
        assert_eq!(seen, ["a.jpg", "b.jpg", "c.jpg"]);
        let counts = images.iter().map(|(_, d)| d.len()).collect::<Vec<_>>();
        assert_eq!(counts, [1, 0, 2]);
    }
}
