//! Image manipulation through an external ImageMagick-compatible tool.
//!
//! Every operation is expressed as a [`ConvertCommand`] and handed to an
//! [`ImageTool`], so the pipeline can be exercised without the real binary.

pub mod animate;
pub mod composite;
pub mod layout;
pub mod process;

use std::{
    ffi::{OsStr, OsString},
    fmt, fs,
    path::Path,
    process::Command,
};

use tracing::debug;

use crate::{
    error::{PipelineError, Result},
    feed::Conversion,
};

use self::animate::numbered_frames;

/// Argument list for one invocation of the image tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertCommand {
    args: Vec<OsString>,
}

impl ConvertCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Path written by the command, which is always the last argument.
    pub fn output(&self) -> Option<&Path> {
        self.args.last().map(Path::new)
    }
}

impl fmt::Display for ConvertCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<_> = self.args.iter().map(|a| a.to_string_lossy()).collect();
        f.write_str(&args.join(" "))
    }
}

pub trait ImageTool {
    fn run(&self, command: &ConvertCommand) -> Result<()>;
}

/// Runs commands through the ImageMagick `convert` binary.
pub struct Magick {
    program: String,
}

impl Magick {
    pub fn new(program: impl Into<String>) -> Self {
        Magick {
            program: program.into(),
        }
    }
}

impl ImageTool for Magick {
    fn run(&self, command: &ConvertCommand) -> Result<()> {
        debug!(program = %self.program, args = %command, "running image tool");
        let output = Command::new(&self.program)
            .args(command.args())
            .output()
            .map_err(|e| PipelineError::image_tool(&self.program, e.to_string()))?;

        if !output.status.success() {
            return Err(PipelineError::image_tool(
                &self.program,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(())
    }
}

pub fn crop(input: &Path, geometry: &str, output: &Path) -> ConvertCommand {
    ConvertCommand::new()
        .arg(input)
        .arg("-crop")
        .arg(geometry)
        .arg("+repage")
        .arg(output)
}

pub fn resize(input: &Path, geometry: &str, output: &Path) -> ConvertCommand {
    ConvertCommand::new()
        .arg(input)
        .arg("-resize")
        .arg(geometry)
        .arg("+repage")
        .arg(output)
}

/// Circle marker centred on `(x, y)`.
pub fn circle(path: &Path, x: u32, y: u32, radius: u32, fill: &str, stroke: &str) -> ConvertCommand {
    ConvertCommand::new()
        .arg(path)
        .arg("-fill")
        .arg(fill)
        .arg("-stroke")
        .arg(stroke)
        .arg("-draw")
        .arg(format!("circle {},{} {},{}", x, y, x + radius, y + radius))
        .arg(path)
}

/// Pads the image on the right with white up to `geometry`.
pub fn extend_right(path: &Path, geometry: &str) -> ConvertCommand {
    ConvertCommand::new()
        .arg(path)
        .arg("-resize")
        .arg(geometry)
        .arg("-background")
        .arg("white")
        .arg("-gravity")
        .arg("west")
        .arg("-extent")
        .arg(geometry)
        .arg(path)
}

pub fn annotate(path: &Path, x: u32, y: u32, text: &str) -> ConvertCommand {
    ConvertCommand::new()
        .arg(path)
        .arg("-pointsize")
        .arg("50")
        .arg("-annotate")
        .arg(format!("+{}+{}", x, y))
        .arg(text)
        .arg(path)
}

pub fn append_horizontal(left: &Path, right: &Path, output: &Path) -> ConvertCommand {
    ConvertCommand::new()
        .arg("+append")
        .arg(left)
        .arg(right)
        .arg("+repage")
        .arg(output)
}

pub fn append_vertical(top: &Path, bottom: &Path, output: &Path) -> ConvertCommand {
    ConvertCommand::new()
        .arg(top)
        .arg(bottom)
        .arg("-append")
        .arg(output)
}

pub fn coalesce(input: &Path, output: &Path) -> ConvertCommand {
    ConvertCommand::new().arg("-coalesce").arg(input).arg(output)
}

pub fn trim(path: &Path) -> ConvertCommand {
    ConvertCommand::new()
        .arg(path)
        .arg("-trim")
        .arg("-border")
        .arg("0")
        .arg("+repage")
        .arg(path)
}

/// Runs the post-fetch conversion of a freshly downloaded file in `dir`.
pub fn apply_conversion<T: ImageTool + ?Sized>(
    tool: &T,
    dir: &Path,
    file_name: &str,
    conversion: &Conversion,
) -> Result<()> {
    let input = dir.join(file_name);

    match conversion {
        Conversion::Coalesce { output } => tool.run(&coalesce(&input, &dir.join(output))),
        Conversion::Frames { stem, latest } => {
            tool.run(&coalesce(&input, &dir.join(format!("{}.png", stem))))?;

            let frames = numbered_frames(dir, &format!("{}-", stem))?;
            match frames.last() {
                Some((_, newest)) => {
                    fs::copy(newest, dir.join(latest))?;
                    Ok(())
                }
                None => Err(PipelineError::image_tool(
                    "coalesce",
                    format!("no frames extracted from {}", file_name),
                )),
            }
        }
    }
}


// -- Tests -------------------------------------------------------------------
