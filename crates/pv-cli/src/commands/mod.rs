pub mod contours;
pub mod cutfill;
pub mod info;
pub mod layout;
pub mod mesh;
pub mod slope;
pub mod spacing;

use pv_layout::{PanelSpec, RackTemplate};

use crate::TemplateArgs;

/// Build a rack template from the shared CLI flags.
pub fn template_from_args(args: &TemplateArgs) -> RackTemplate {
    let panel = PanelSpec {
        power_watts: args.panel_watts,
        ..PanelSpec::default()
    };
    if args.tilt == 0.0 {
        RackTemplate::single_axis_tracker("cli-tracker", panel, args.panels_per_row, args.rows)
    } else {
        RackTemplate::fixed_tilt(
            "cli-fixed",
            panel,
            args.panels_per_row,
            args.rows,
            args.tilt,
        )
    }
}
