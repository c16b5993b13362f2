use std::time::Instant;

use log::{debug, info};

use crate::config::{DatabaseOptions, StoreKind};
use crate::db::memory::{MemoryStore, StagedFace};
use crate::db::{self, Database, FaceInfo, FaceMetadata, MatchResult, Population, crud};
use crate::encoding::FaceDescriptor;
use crate::error::{FaceDbError, Result, StoreError};
use crate::metrics;

enum FaceStore {
    Postgres(Database),
    Memory(MemoryStore),
}

/// 人脸库
///
/// 每次操作独占一个数据库会话，结束时无论成功与否都会归还连接；
/// 写操作在事务中完成，出错时事务随 drop 回滚。
pub struct FaceDB {
    store: FaceStore,
}

impl FaceDB {
    /// 按配置打开人脸库，并确保配置的人脸表存在
    pub async fn open(opts: &DatabaseOptions) -> anyhow::Result<Self> {
        let store = match opts.store {
            StoreKind::Postgres => FaceStore::Postgres(db::init_db(opts).await?),
            StoreKind::Memory => {
                info!("使用内存存储");
                let store = MemoryStore::new();
                store.create_population(&opts.population).await;
                FaceStore::Memory(store)
            }
        };
        Ok(Self { store })
    }

    /// 使用已有的连接池
    pub fn from_pool(pool: Database) -> Self {
        Self { store: FaceStore::Postgres(pool) }
    }

    /// 创建人脸表，已存在时不做任何事
    pub async fn create_population(&self, population: &Population) -> anyhow::Result<()> {
        match &self.store {
            FaceStore::Postgres(pool) => crud::create_population(pool, population).await?,
            FaceStore::Memory(store) => store.create_population(population).await,
        }
        Ok(())
    }

    /// 在 `population` 中搜索与 `descriptor` 距离不超过 `confidence` 的前 `k` 个人脸
    ///
    /// 没有匹配时返回空列表；`k <= 0` 时直接返回空列表。
    pub async fn search(
        &self,
        population: &Population,
        descriptor: &FaceDescriptor,
        k: i64,
        confidence: f64,
    ) -> Result<Vec<MatchResult>> {
        if k <= 0 {
            return Ok(vec![]);
        }

        let start = Instant::now();
        let result = match &self.store {
            FaceStore::Postgres(pool) => {
                let mut conn = pool.acquire().await.map_err(to_search_error)?;
                crud::search_faces(&mut *conn, population, descriptor, k, confidence)
                    .await
                    .map_err(to_search_error)?
            }
            FaceStore::Memory(store) => store
                .search(population, descriptor, k, confidence)
                .await
                .map_err(FaceDbError::SearchFailed)?,
        };
        let elapsed = start.elapsed().as_secs_f32();

        debug!("搜索 {population}: k = {k}, confidence = {confidence}, {} 个结果, {elapsed:.3}s", result.len());
        metrics::inc_search(population.as_str(), elapsed, result.len());

        Ok(result)
    }

    /// 添加一张人脸并提交，返回新记录的 ID
    pub async fn register(
        &self,
        population: &Population,
        filename: &str,
        descriptor: &FaceDescriptor,
    ) -> Result<i64> {
        let id = match &self.store {
            FaceStore::Postgres(pool) => {
                let mut tx = pool.begin().await.map_err(to_insert_error)?;
                let id = crud::add_face(&mut *tx, population, filename, descriptor)
                    .await
                    .map_err(to_insert_error)?;
                tx.commit().await.map_err(to_insert_error)?;
                id
            }
            FaceStore::Memory(store) => {
                let staged = vec![StagedFace::new(filename, descriptor)];
                let ids = store.commit(population, staged).await.map_err(FaceDbError::InsertFailed)?;
                ids[0]
            }
        };
        metrics::inc_registered(population.as_str(), 1);
        Ok(id)
    }

    /// 在同一个事务中添加多张人脸，任意一张失败则全部不可见
    pub async fn register_batch(
        &self,
        population: &Population,
        faces: &[(String, FaceDescriptor)],
    ) -> Result<Vec<i64>> {
        let ids = match &self.store {
            FaceStore::Postgres(pool) => {
                let mut tx = pool.begin().await.map_err(to_insert_error)?;
                let mut ids = Vec::with_capacity(faces.len());
                for (filename, descriptor) in faces {
                    let id = crud::add_face(&mut *tx, population, filename, descriptor)
                        .await
                        .map_err(to_insert_error)?;
                    ids.push(id);
                }
                tx.commit().await.map_err(to_insert_error)?;
                ids
            }
            FaceStore::Memory(store) => {
                let staged = faces
                    .iter()
                    .map(|(filename, descriptor)| StagedFace::new(filename, descriptor))
                    .collect();
                store.commit(population, staged).await.map_err(FaceDbError::InsertFailed)?
            }
        };
        info!("已添加 {} 张人脸到 {population}", ids.len());
        metrics::inc_registered(population.as_str(), ids.len());
        Ok(ids)
    }

    pub async fn face_info(&self, population: &Population, id: i64) -> Result<Option<FaceInfo>> {
        match &self.store {
            FaceStore::Postgres(pool) => crud::get_face_info(pool, population, id)
                .await
                .map_err(|e| FaceDbError::LookupFailed(e.into())),
            FaceStore::Memory(store) => {
                store.face_info(population, id).await.map_err(FaceDbError::LookupFailed)
            }
        }
    }

    /// 更新元数据并提交，返回是否存在对应记录
    pub async fn update_metadata(
        &self,
        population: &Population,
        id: i64,
        metadata: &FaceMetadata,
    ) -> Result<bool> {
        match &self.store {
            FaceStore::Postgres(pool) => {
                let to_error = |e: sqlx::Error| FaceDbError::UpdateFailed(e.into());
                let mut tx = pool.begin().await.map_err(to_error)?;
                let updated =
                    crud::update_metadata(&mut *tx, population, id, metadata).await.map_err(to_error)?;
                tx.commit().await.map_err(to_error)?;
                Ok(updated)
            }
            FaceStore::Memory(store) => store
                .update_metadata(population, id, metadata)
                .await
                .map_err(FaceDbError::UpdateFailed),
        }
    }

    pub async fn count_faces(&self, population: &Population) -> Result<i64> {
        match &self.store {
            FaceStore::Postgres(pool) => crud::count_faces(pool, population)
                .await
                .map_err(|e| FaceDbError::LookupFailed(e.into())),
            FaceStore::Memory(store) => {
                store.count_faces(population).await.map_err(FaceDbError::LookupFailed)
            }
        }
    }
}

fn to_search_error(e: sqlx::Error) -> FaceDbError {
    FaceDbError::SearchFailed(StoreError::Database(e))
}

fn to_insert_error(e: sqlx::Error) -> FaceDbError {
    FaceDbError::InsertFailed(StoreError::Database(e))
}
