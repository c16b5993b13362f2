use sqlx::{Executor, PgPool, Postgres, Result};

use super::{FaceInfo, FaceMetadata, MatchResult, Population};
use crate::encoding::{FaceDescriptor, split_encoding};

/// 去掉文件名最后一个 `.` 及其后的内容作为人名，没有 `.` 时返回原文件名
pub fn person_name_from_filename(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(end) => &filename[..end],
        None => filename,
    }
}

pub(crate) fn create_table_sql(population: &Population) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            face_id BIGSERIAL PRIMARY KEY,
            person_name TEXT NOT NULL,
            image_encoding_p1 cube NOT NULL,
            image_encoding_p2 cube NOT NULL,
            version_number TEXT,
            date TEXT,
            location TEXT
        )
        "#,
        population.quoted()
    )
}

pub(crate) fn insert_sql(population: &Population) -> String {
    format!(
        r#"
        INSERT INTO {} (person_name, image_encoding_p1, image_encoding_p2)
        VALUES ($1, $2::text::cube, $3::text::cube)
        RETURNING face_id
        "#,
        population.quoted()
    )
}

/// 两个半向量各自求距离的平方，相加后开方即完整的欧氏距离
pub(crate) fn search_sql(population: &Population) -> String {
    format!(
        r#"
        SELECT face_id, person_name FROM (
            SELECT face_id, person_name, sqrt(
                power(image_encoding_p1 <-> cube(string_to_array($1::text, ',')::float8[]), 2) +
                power(image_encoding_p2 <-> cube(string_to_array($2::text, ',')::float8[]), 2)
            ) AS distance
            FROM {}
        ) AS candidate
        WHERE distance <= $3
        ORDER BY distance
        LIMIT $4
        "#,
        population.quoted()
    )
}

/// 创建 cube 扩展和人脸表
pub async fn create_population(executor: &PgPool, population: &Population) -> Result<()> {
    sqlx::query("CREATE EXTENSION IF NOT EXISTS cube").execute(executor).await?;
    sqlx::query(&create_table_sql(population)).execute(executor).await?;
    Ok(())
}

/// 添加一条人脸记录，返回新记录的 ID
///
/// 不会提交事务，由调用方决定何时提交。
pub async fn add_face<'c, E>(
    executor: E,
    population: &Population,
    filename: &str,
    descriptor: &FaceDescriptor,
) -> Result<i64>
where
    E: Executor<'c, Database = Postgres>,
{
    let person_name = person_name_from_filename(filename);
    let (part1, part2) = split_encoding(descriptor, true);

    let (id,): (i64,) = sqlx::query_as(&insert_sql(population))
        .bind(person_name)
        .bind(part1)
        .bind(part2)
        .fetch_one(executor)
        .await?;

    Ok(id)
}

/// 搜索距离不超过 `confidence` 的前 `k` 个人脸
pub async fn search_faces<'c, E>(
    executor: E,
    population: &Population,
    descriptor: &FaceDescriptor,
    k: i64,
    confidence: f64,
) -> Result<Vec<MatchResult>>
where
    E: Executor<'c, Database = Postgres>,
{
    let (part1, part2) = split_encoding(descriptor, false);

    sqlx::query_as(&search_sql(population))
        .bind(part1)
        .bind(part2)
        .bind(confidence)
        .bind(k)
        .fetch_all(executor)
        .await
}

pub async fn get_face_info<'c, E>(
    executor: E,
    population: &Population,
    id: i64,
) -> Result<Option<FaceInfo>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!(
        "SELECT person_name, version_number, date, location FROM {} WHERE face_id = $1",
        population.quoted()
    );
    sqlx::query_as(&sql).bind(id).fetch_optional(executor).await
}

/// 更新元数据，返回是否找到了对应记录
pub async fn update_metadata<'c, E>(
    executor: E,
    population: &Population,
    id: i64,
    metadata: &FaceMetadata,
) -> Result<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!(
        "UPDATE {} SET version_number = $1, date = $2, location = $3 WHERE face_id = $4",
        population.quoted()
    );
    let result = sqlx::query(&sql)
        .bind(&metadata.version_number)
        .bind(&metadata.date)
        .bind(&metadata.location)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_faces<'c, E>(executor: E, population: &Population) -> Result<i64>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT COUNT(*) FROM {}", population.quoted());
    let (count,): (i64,) = sqlx::query_as(&sql).fetch_one(executor).await?;
    Ok(count)
}
