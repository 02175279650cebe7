mod common;

use predicates::prelude::PredicateBooleanExt;
use serde_json::Value;
use templar_core::AnyEmptyResult;

#[test]
fn scan_prints_parameter_rows() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "a.txt", "Hello <NAME>, welcome\n")?;
	common::write(tmp.path(), "other.txt", "<OTHER>\n")?;

	common::templar_cmd()
		.arg("scan")
		.arg("--path")
		.arg(tmp.path())
		.arg("--linked")
		.arg("a.txt")
		.assert()
		.success()
		.stdout(predicates::str::contains("1 parameter row(s) (merge: no)"))
		.stdout(predicates::str::contains("<NAME>,a.txt,Hello <NAME> welcome"))
		.stdout(predicates::str::contains("<OTHER>").not());

	Ok(())
}

#[test]
fn scan_reads_templar_toml() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"templar.toml",
		"changes_file = \"changes.txt\"\nmerge = \"file\"\n\n[linked]\nnames = [\"a.txt\", \
		 \"d.csv\"]\n",
	)?;
	common::write(tmp.path(), "a.txt", "<P> one\n<P> two\n")?;
	common::write(tmp.path(), "d.csv", "KEY,x,y\n")?;
	common::write(tmp.path(), "changes.txt", "<NOT_SCANNED>\n")?;

	common::templar_cmd()
		.arg("scan")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(r"<P>,a.txt,<P> one\n***\n<P> two"))
		.stdout(predicates::str::contains("KEY,d.csv,x | y"))
		.stdout(predicates::str::contains("<NOT_SCANNED>").not());

	Ok(())
}

#[test]
fn scan_json_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "a.txt", "Hello <NAME>, welcome\n")?;

	let output = common::templar_cmd()
		.arg("scan")
		.arg("--path")
		.arg(tmp.path())
		.arg("--linked")
		.arg("a.txt")
		.arg("--merge")
		.arg("all")
		.arg("--format")
		.arg("json")
		.output()?;
	assert!(output.status.success());

	let value: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(value["merge"], "all");
	assert_eq!(value["invalid_param_found"], false);
	assert_eq!(
		value["parameter_rows"][0],
		"<NAME>,a.txt,Hello <NAME> welcome"
	);
	assert!(value["linked"]["templates"]["a.txt"].is_string());
	assert!(value["script"].as_str().is_some_and(|script| script.contains("var v_a_txt")));

	Ok(())
}

#[test]
fn scan_writes_artifacts() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let templates = tmp.path().join("templates");
	let out = tmp.path().join("out");
	common::write(&templates, "a.txt", "Hello <NAME>, welcome\n")?;
	common::write(&templates, "d.csv", "KEY,x\n")?;

	common::templar_cmd()
		.arg("scan")
		.arg("--path")
		.arg(&templates)
		.arg("--linked")
		.arg("a.txt")
		.arg("--linked")
		.arg("d.csv")
		.arg("--out")
		.arg(&out)
		.assert()
		.success();

	assert_eq!(
		std::fs::read_to_string(out.join("parameters.csv"))?,
		"<NAME>,a.txt,Hello <NAME> welcome\n"
	);
	assert_eq!(
		std::fs::read_to_string(out.join("decisions.csv"))?,
		"KEY,d.csv,x\n"
	);
	assert!(std::fs::read_to_string(out.join("templates.js"))?.starts_with("    var v_a_txt = ["));

	let linked: Value = serde_json::from_str(&std::fs::read_to_string(out.join("templates.json"))?)?;
	assert!(linked["templates"]["a.txt"].is_string());
	assert!(linked["templates"]["d.csv"].is_string());

	Ok(())
}

#[test]
fn scan_rejects_bogus_merge_before_writing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let out = tmp.path().join("out");
	common::write(tmp.path(), "a.txt", "<P>\n")?;

	common::templar_cmd()
		.arg("scan")
		.arg("--path")
		.arg(tmp.path())
		.arg("--linked")
		.arg("a.txt")
		.arg("--merge")
		.arg("bogus")
		.arg("--out")
		.arg(&out)
		.assert()
		.code(2)
		.stderr(predicates::str::contains("invalid merge policy"));

	assert!(!out.exists());

	Ok(())
}

#[test]
fn scan_without_subcommand_fails() {
	common::templar_cmd()
		.assert()
		.code(1)
		.stderr(predicates::str::contains("No subcommand specified"));
}

#[test]
fn scan_merge_flag_overrides_invalid_config_value() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"templar.toml",
		"merge = \"bogus\"\n\n[linked]\nnames = [\"a.txt\"]\n",
	)?;
	common::write(tmp.path(), "a.txt", "<P> one\n<P> two\n")?;

	common::templar_cmd()
		.arg("scan")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("invalid merge policy"));

	common::templar_cmd()
		.arg("scan")
		.arg("--path")
		.arg(tmp.path())
		.arg("--merge")
		.arg("file")
		.assert()
		.success()
		.stdout(predicates::str::contains("(merge: file)"))
		.stdout(predicates::str::contains(r"<P>,a.txt,<P> one\n***\n<P> two"));

	Ok(())
}

#[test]
fn scan_processes_gitignored_linked_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), ".gitignore", "*.txt\n")?;
	common::write(tmp.path(), "intf.txt", "x <P> y\n")?;

	common::templar_cmd()
		.arg("scan")
		.arg("--path")
		.arg(tmp.path())
		.arg("--linked")
		.arg("intf.txt")
		.assert()
		.success()
		.stdout(predicates::str::contains("<P>,intf.txt,x <P> y"));

	Ok(())
}
