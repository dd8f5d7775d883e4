//! PNG chart rendering of simulation runs (feature `charts`)

use std::path::Path;

use plotters::prelude::*;

use crate::error::ExportError;
use crate::simulator::SimulationOutput;

/// Render the residual-reserve trajectory as a PNG line chart.
///
/// Plots muscle, liver, and total glycogen against time, with the
/// hypoglycemia floor marked when the run touches it.
pub fn render_reserves_chart<P: AsRef<Path>>(
    output: &SimulationOutput,
    output_path: P,
) -> Result<(), ExportError> {
    let path = output_path.as_ref().to_path_buf();

    let times: Vec<f64> = output.rows.iter().map(|r| r.time_min as f64).collect();
    let x_max = times.iter().copied().fold(1.0, f64::max);
    let y_max = output
        .rows
        .iter()
        .map(|r| r.residual_total_g)
        .fold(1.0, f64::max);

    let draw = || -> Result<(), Box<dyn std::error::Error>> {
        let root = BitMapBackend::new(&path, (1280, 720)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(25)
            .caption("Glycogen reserves", ("sans-serif", 28))
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0.0..x_max, 0.0..(y_max * 1.1))?;

        chart
            .configure_mesh()
            .x_desc("Time (min)")
            .y_desc("Glycogen (g)")
            .x_label_formatter(&|v| format!("{:.0}", v))
            .y_label_formatter(&|v| format!("{:.0}", v))
            .draw()?;

        chart
            .draw_series(LineSeries::new(
                times
                    .iter()
                    .copied()
                    .zip(output.rows.iter().map(|r| r.residual_muscle_g)),
                &RGBColor(200, 0, 100),
            ))?
            .label("Muscle")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], RGBColor(200, 0, 100)));

        chart
            .draw_series(LineSeries::new(
                times
                    .iter()
                    .copied()
                    .zip(output.rows.iter().map(|r| r.residual_liver_g)),
                &RGBColor(0, 100, 200),
            ))?
            .label("Liver")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], RGBColor(0, 100, 200)));

        chart
            .draw_series(LineSeries::new(
                times
                    .iter()
                    .copied()
                    .zip(output.rows.iter().map(|r| r.residual_total_g)),
                &BLACK,
            ))?
            .label("Total")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], BLACK));

        if let Some(bonk) = output.bonk_time() {
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(bonk as f64, 0.0), (bonk as f64, y_max)],
                RED.stroke_width(2),
            )))?;
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    };

    draw().map_err(|e| ExportError::ExportFailed {
        path,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityParameters, Subject};
    use crate::simulator::{SimulationInputs, Simulator};
    use crate::tank::TankCalculator;
    use tempfile::tempdir;

    #[test]
    fn test_render_reserves_chart() {
        let subject = Subject::default();
        let tank = TankCalculator::compute_tank(&subject);
        let inputs = SimulationInputs {
            duration_min: 30.0,
            ..SimulationInputs::default()
        };
        let output =
            Simulator::simulate(&tank, &subject, &ActivityParameters::default(), &inputs);

        let dir = tempdir().unwrap();
        let path = dir.path().join("reserves.png");
        render_reserves_chart(&output, &path).unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert!(meta.len() > 0);
    }
}
