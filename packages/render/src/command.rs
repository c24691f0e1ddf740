//! Renderer that delegates to an external program.
//!
//! The program is invoked once per image as
//!
//! ```text
//! <program> --bbox <min_x>,<min_y>,<max_x>,<max_y> --size <width>x<height>
//!           --point <x>,<y> --marker <icon> --output <file>
//! ```
//!
//! with all coordinates in Web Mercator meters, and must exit with status
//! zero once the image has been written.

use std::ffi::OsString;
use std::process::Command;

use crate::{MapRenderer, RenderError, RenderRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRenderer {
    program: String,
}

impl CommandRenderer {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command-line arguments for `request`.
    #[must_use]
    pub fn args(request: &RenderRequest<'_>) -> Vec<OsString> {
        let bounds = request.viewport();
        let (x, y) = request.center.x_y();

        vec![
            "--bbox".into(),
            format!(
                "{:.2},{:.2},{:.2},{:.2}",
                bounds.min().x,
                bounds.min().y,
                bounds.max().x,
                bounds.max().y
            )
            .into(),
            "--size".into(),
            format!("{}x{}", request.width, request.height).into(),
            "--point".into(),
            format!("{x:.2},{y:.2}").into(),
            "--marker".into(),
            request.marker_icon.into(),
            "--output".into(),
            request.output.into(),
        ]
    }
}

impl MapRenderer for CommandRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> Result<(), RenderError> {
        request.validate()?;

        log::debug!(
            "Running {} for {}",
            self.program,
            request.output.display()
        );

        let status = Command::new(&self.program)
            .args(Self::args(request))
            .status()
            .map_err(|source| RenderError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(RenderError::Command {
                program: self.program.clone(),
                status,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use geo::Point;

    use super::*;

    fn request(output: &Path) -> RenderRequest<'_> {
        RenderRequest {
            center: Point::new(1000.0, -250.5),
            half_width_m: 2000.0,
            width: 1024,
            height: 768,
            marker_icon: Path::new("static/img/marker-icon-2x-red.png"),
            output,
        }
    }

    #[test]
    fn passes_bounding_box_and_point() {
        let args = CommandRenderer::args(&request(Path::new("out/100_0_2000.png")));
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            [
                "--bbox",
                "-1000.00,-2250.50,3000.00,1749.50",
                "--size",
                "1024x768",
                "--point",
                "1000.00,-250.50",
                "--marker",
                "static/img/marker-icon-2x-red.png",
                "--output",
                "out/100_0_2000.png",
            ]
        );
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let renderer = CommandRenderer::new("loc-analyze-no-such-renderer");
        let result = renderer.render(&request(Path::new("out.png")));

        assert!(matches!(result, Err(RenderError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn failing_program_is_command_error() {
        let renderer = CommandRenderer::new("false");
        let result = renderer.render(&request(Path::new("out.png")));

        assert!(matches!(result, Err(RenderError::Command { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn successful_program_is_ok() {
        assert!(
            CommandRenderer::new("true")
                .render(&request(Path::new("out.png")))
                .is_ok()
        );
    }
}
