use std::collections::HashMap;

use tokio::sync::RwLock;

use super::crud::person_name_from_filename;
use super::{FaceInfo, FaceMetadata, MatchResult, Population};
use crate::encoding::{FaceDescriptor, combine_distances, euclidean_distance, parse_encoding, split_encoding};
use crate::error::StoreError;

type Result<T> = std::result::Result<T, StoreError>;

/// 内存中的一行记录，布局与数据库表一致
#[derive(Debug, Clone)]
struct FaceRow {
    face_id: i64,
    person_name: String,
    image_encoding_p1: String,
    image_encoding_p2: String,
    version_number: Option<String>,
    date: Option<String>,
    location: Option<String>,
}

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: Vec<FaceRow>,
}

/// 已暂存但尚未提交的记录
#[derive(Debug)]
pub struct StagedFace {
    person_name: String,
    image_encoding_p1: String,
    image_encoding_p2: String,
}

impl StagedFace {
    pub fn new(filename: &str, descriptor: &FaceDescriptor) -> Self {
        let (part1, part2) = split_encoding(descriptor, true);
        Self {
            person_name: person_name_from_filename(filename).to_owned(),
            image_encoding_p1: part1,
            image_encoding_p2: part2,
        }
    }
}

/// 内存存储后端，语义和 PostgreSQL 后端保持一致，进程退出后数据丢失
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Population, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_population(&self, population: &Population) {
        self.tables.write().await.entry(population.clone()).or_default();
    }

    /// 一次性写入所有暂存记录，返回分配的 ID
    pub async fn commit(&self, population: &Population, staged: Vec<StagedFace>) -> Result<Vec<i64>> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(population)
            .ok_or_else(|| StoreError::UnknownPopulation(population.clone()))?;

        let mut ids = Vec::with_capacity(staged.len());
        for face in staged {
            table.next_id += 1;
            table.rows.push(FaceRow {
                face_id: table.next_id,
                person_name: face.person_name,
                image_encoding_p1: face.image_encoding_p1,
                image_encoding_p2: face.image_encoding_p2,
                version_number: None,
                date: None,
                location: None,
            });
            ids.push(table.next_id);
        }
        Ok(ids)
    }

    pub async fn search(
        &self,
        population: &Population,
        descriptor: &FaceDescriptor,
        k: i64,
        confidence: f64,
    ) -> Result<Vec<MatchResult>> {
        let (part1, part2) = split_encoding(descriptor, false);
        let (part1, part2) = (parse_encoding(&part1)?, parse_encoding(&part2)?);

        let tables = self.tables.read().await;
        let table =
            tables.get(population).ok_or_else(|| StoreError::UnknownPopulation(population.clone()))?;

        let mut candidates = Vec::new();
        for row in &table.rows {
            let d1 = euclidean_distance(&parse_encoding(&row.image_encoding_p1)?, &part1);
            let d2 = euclidean_distance(&parse_encoding(&row.image_encoding_p2)?, &part2);
            let distance = combine_distances(d1, d2);
            if distance <= confidence {
                candidates.push((distance, row));
            }
        }

        // 稳定排序，距离相同时保留插入顺序
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(candidates
            .into_iter()
            .take(k.max(0) as usize)
            .map(|(_, row)| MatchResult { id: row.face_id, person_name: row.person_name.clone() })
            .collect())
    }

    pub async fn face_info(&self, population: &Population, id: i64) -> Result<Option<FaceInfo>> {
        let tables = self.tables.read().await;
        let table =
            tables.get(population).ok_or_else(|| StoreError::UnknownPopulation(population.clone()))?;
        Ok(table.rows.iter().find(|row| row.face_id == id).map(|row| FaceInfo {
            person_name: Some(row.person_name.clone()),
            version_number: row.version_number.clone(),
            date: row.date.clone(),
            location: row.location.clone(),
        }))
    }

    pub async fn update_metadata(
        &self,
        population: &Population,
        id: i64,
        metadata: &FaceMetadata,
    ) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(population)
            .ok_or_else(|| StoreError::UnknownPopulation(population.clone()))?;
        match table.rows.iter_mut().find(|row| row.face_id == id) {
            Some(row) => {
                row.version_number = Some(metadata.version_number.clone());
                row.date = Some(metadata.date.clone());
                row.location = Some(metadata.location.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn count_faces(&self, population: &Population) -> Result<i64> {
        let tables = self.tables.read().await;
        let table =
            tables.get(population).ok_or_else(|| StoreError::UnknownPopulation(population.clone()))?;
        Ok(table.rows.len() as i64)
    }
}
