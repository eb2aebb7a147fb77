mod model;
mod store;

pub use model::{AUTHOR, CREATED_AT, Course, CoursePatch, FIELDS, ID, NAME, NewCourse, PUBLISHED, TAGS};
pub use store::{COLLECTION, CourseQuery, CourseStore};
