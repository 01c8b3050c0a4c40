use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn dm_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("dm"));
	cmd.env("NO_COLOR", "1").env_remove("DM_LOG");
	cmd
}
