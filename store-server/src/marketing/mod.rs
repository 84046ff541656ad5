//! 营销模块：生日问候与忠诚度折扣

pub mod birthday;

pub use birthday::BirthdayScheduler;
