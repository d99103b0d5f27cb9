#[test]
fn ui_pass() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/command_basic.rs");
    t.pass("tests/ui/command_existing_fields.rs");
    t.pass("tests/ui/object_basic.rs");
}
