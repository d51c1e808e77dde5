/*++

Licensed under the Apache-2.0 license.

File Name:

    suite.rs

Abstract:

    File contains the suite and registry data model of the battery.

--*/

use crate::case::TestCase;

/// Ordered collection of cases exercising one hardware function.
pub struct TestSuite {
    pub name: &'static str,
    pub cases: &'static [&'static TestCase],

    /// Keep running the remaining cases after one fails. The default
    /// policy is fail-fast.
    pub continue_on_failure: bool,
}

/// Identity of the battery build, surfaced to the reporter at run start.
/// The strings have no behavioral effect.
pub struct BuildInfo {
    pub component: &'static str,
    pub version: &'static str,
    pub board: &'static str,
}

/// The complete battery, fixed at build time. Suite and case order is
/// total; the engine walks it front to back.
pub struct SuiteRegistry {
    pub build: BuildInfo,
    pub suites: &'static [&'static TestSuite],

    /// Keep running the remaining suites after one concludes with a
    /// failure in it.
    pub continue_on_failure: bool,
}
