mod frames;
mod quizzes;
mod segments;
mod sessions;
