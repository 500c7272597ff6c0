// Drops a block of snow onto the floor of a 32^3 grid and reports its settling.
use nuclear_mpm::{
    MaterialModel, PositionTable, Real, Simulation, SimulationParams, StencilBound, WeightScheme,
};

const RESOLUTION: usize = 32;
const BLOCK_MIN: Real = 0.35;
const PARTICLES_PER_AXIS: usize = 16;

fn init_particles(dx: Real) -> PositionTable {
    let spacing = dx * 0.5;
    let mut data = Vec::with_capacity(PARTICLES_PER_AXIS.pow(3) * 3);
    for i in 0..PARTICLES_PER_AXIS {
        for j in 0..PARTICLES_PER_AXIS {
            for k in 0..PARTICLES_PER_AXIS {
                data.extend([
                    BLOCK_MIN + i as Real * spacing,
                    BLOCK_MIN + j as Real * spacing,
                    BLOCK_MIN + k as Real * spacing,
                ]);
            }
        }
    }
    PositionTable::from_row_slice(&data)
}

fn centroid(positions: &PositionTable) -> [Real; 3] {
    let n = positions.nrows().max(1) as Real;
    let mut sum = [0.0; 3];
    for row in positions.row_iter() {
        for axis in 0..3 {
            sum[axis] += row[axis];
        }
    }
    sum.map(|s| s / n)
}

fn main() {
    tracing_subscriber::fmt::init();

    let timesteps = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(500);

    let dx = 1.0 / RESOLUTION as Real;
    let volume = (dx * 0.5).powi(3);
    let density = 400.0;

    // Snow with the partition-of-unity kernel and grid-sized stencil bounds
    let params = SimulationParams::default()
        .with_resolution(RESOLUTION)
        .with_cell_width(dx)
        .with_dt(1e-4)
        .with_particle(volume * density, volume)
        .with_lame(5.833e4, 3.889e4)
        .with_hardening(10.0)
        .with_gravity(-9.8)
        .with_timesteps(timesteps)
        .with_model(MaterialModel::Snow)
        .with_weighting(WeightScheme::Separable)
        .with_stencil_bound(StencilBound::GridResolution);

    let positions = init_particles(dx);
    let start = centroid(&positions);
    println!(
        "Simulating {} particles for {} steps",
        positions.nrows(),
        timesteps
    );

    let mut simulation = match Simulation::new(params, &positions) {
        Ok(simulation) => simulation,
        Err(err) => {
            eprintln!("invalid setup: {err}");
            std::process::exit(1);
        }
    };

    let report_every = (timesteps / 10).max(1);
    let result = simulation.run_with_progress(|done, total| {
        if done % report_every == 0 || done == total {
            println!("[step {done:05}/{total}]");
        }
    });

    match result {
        Ok(trajectory) => {
            let end = trajectory.last().map(centroid).unwrap_or(start);
            let jp_min = simulation
                .particles()
                .jp
                .iter()
                .copied()
                .fold(Real::INFINITY, Real::min);
            println!(
                "centroid {:.4?} -> {:.4?}, min Jp {:.4}",
                start, end, jp_min
            );
        }
        Err(err) => {
            eprintln!("simulation aborted: {err}");
            std::process::exit(1);
        }
    }
}
