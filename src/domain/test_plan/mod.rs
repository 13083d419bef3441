//! Test plan domain - plans, suites and test cases

mod entity;

pub use entity::{SuiteReference, TestCase, TestCaseWorkItem, TestPlan, TestPlanDetails, TestSuite};
