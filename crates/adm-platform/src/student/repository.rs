//! Student Repository

use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, Database, IndexModel};

use crate::shared::error::Result;
use crate::student::entity::{format_student_id, parse_student_id, EvalStatus, Student, TEMP_ID};

pub struct StudentRepository {
    collection: Collection<Student>,
}

impl StudentRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("students"),
        }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        for field in ["studentId", "email"] {
            let index = IndexModel::builder()
                .keys(doc! { field: 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.collection.create_index(index).await?;
        }
        Ok(())
    }

    /// Allocate the next sequential student id.
    ///
    /// Reads the current maximum allocated id and increments its suffix;
    /// the caller inserts afterwards with no transaction spanning the two
    /// steps, so concurrent creates can mint the same id.
    pub async fn next_student_id(&self) -> Result<String> {
        // Fixed-width zero padding makes the lexicographic max the numeric max.
        let last = self
            .collection
            .find_one(doc! { "studentId": { "$ne": TEMP_ID } })
            .sort(doc! { "studentId": -1 })
            .await?;

        let next_sequence = last
            .and_then(|s| parse_student_id(&s.student_id))
            .map_or(1, |n| n + 1);

        Ok(format_student_id(next_sequence))
    }

    pub async fn insert(&self, student: &Student) -> Result<()> {
        self.collection.insert_one(student).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Student>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Student>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    pub async fn find_all(&self) -> Result<Vec<Student>> {
        let cursor = self.collection.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_by_counsellor(&self, counsellor_id: &str) -> Result<Vec<Student>> {
        let cursor = self
            .collection
            .find(doc! { "assignedCounsellor": counsellor_id })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn update(&self, student: &Student) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &student.id }, student)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn count_all(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    pub async fn count_by_status(&self, status: EvalStatus) -> Result<u64> {
        let status = bson::to_bson(&status)?;
        Ok(self
            .collection
            .count_documents(doc! { "status": status })
            .await?)
    }
}
