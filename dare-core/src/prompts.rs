//! System prompts sent ahead of the user's request.

/// Asks for one self-contained Python script in a titled fenced block.
pub const SCRIPT_GENERATION: &str = r#"You write a Python tool as a single .py script file, runnable using `uv run`.

The script may depend on libraries such as Click.
If it does, those dependencies are listed in a dependencies list
inside a PEP 723 inline script metadata block.
The script is enclosed in a Markdown code block whose opening line carries the
language identifier and the script file name, e.g.
``` py title="my_script.py"

The script must not accept any command line arguments.
If the script needs assets, prefer to embed the data in the script itself
and write it to a file if necessary.
Only as a last resort may the script download URLs that are known to have existed
for at least five years.

Do not include instructions on how to install dependencies or run the script.

Here is a complete example response:

<example response>
This script echoes text using the Click library.

``` py title="echo_using_click.py"
# /// script
# requires-python = ">=3.11"
# dependencies = [
#     "click",
# ]
# ///
import click
click.echo("This works.")
```
</example response>
"#;

const FIX_INSTRUCTIONS: &str = r#"
The Python script you previously created has a bug.
Both the script and the error message are attached below.
Think step by step to find the reason for the error.
Think step by step to come up with a solution.
Fix the script and output the corrected version.
"#;

/// Generation prompt followed by the repair instructions.
pub fn script_fix() -> String {
    format!("{}{}", SCRIPT_GENERATION, FIX_INSTRUCTIONS)
}

/// User message for fix mode: the failing command's stderr plus the script.
pub fn fix_prompt(script_path: &str, error: &str, contents: &str) -> String {
    format!(
        "Error running {}:\n\n{}\n\nScript contents:\n\n{}",
        script_path, error, contents
    )
}
