// demos/simulate.rs

use env_logger::Env;
use vtol_stabilization::{
    AccumulatorSettings, AxisSticks, CycleInputs, FlightConfig, GyroLpf, PidEngine, Profile,
    Sample, SharedAccumulator,
};

static SENSORS: SharedAccumulator = SharedAccumulator::new();

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut config = FlightConfig::default();

    // Filter the gyro and add a little roll damping.
    config.gyro_lpf = GyroLpf::Hz44;
    config.gains.d_gain = [8, 8, 0];

    // Trim the hover profile slightly nose down.
    config.gains.profiles[Profile::P1.index()].level_trim = [0, -40];

    SENSORS.configure(AccumulatorSettings::from(&config));
    let mut engine = PidEngine::with_config(config);

    // Simulated airframe state.
    let mut rate = [120.0f32, -40.0, 15.0];
    let mut angle = [300.0f32, -150.0];
    let sticks = AxisSticks::from_rc(0, 0, 0);
    let elapsed_ticks = 3571;

    println!("                 Roll,  Pitch,    Yaw |   Roll,  Pitch,      Z");
    for cycle in 0..=20 {
        // Interrupt side: between two and four samples per cycle.
        let samples = if cycle == 10 { 0 } else { 2 + cycle % 3 };
        for _ in 0..samples {
            let gyro = rate.map(|r| r as i16);
            let acc_vert = (rate[0] * 0.1) as i16;
            SENSORS.accumulate(&Sample {
                gyro,
                acc_vert,
                sticks,
                elapsed_ticks,
            });
        }

        // Main loop side.
        let snapshot = SENSORS.take_cycle();
        let inputs = CycleInputs::new(angle[0] as i16, angle[1] as i16);
        let outputs = engine.calculate(&snapshot, &inputs);

        for profile in Profile::ALL {
            let output = outputs.profile(profile);
            println!(
                "cycle {:2} {:?}: {:6}, {:6}, {:6} | {:6}, {:6}, {:6}",
                cycle,
                profile,
                output.gyro[0],
                output.gyro[1],
                output.gyro[2],
                output.acc[0],
                output.acc[1],
                output.acc[2],
            );
        }

        // Simulate the response to the hover profile.
        let hover = outputs.profile(Profile::P1);
        for axis in 0..3 {
            rate[axis] -= hover.gyro[axis] as f32 * 0.2;
        }
        for axis in 0..2 {
            angle[axis] += rate[axis] * 0.05 - hover.acc[axis] as f32;
        }
    }

    let diagnostics = engine.diagnostics();
    println!(
        "cycles: {}, stale: {}, overflows: {}",
        diagnostics.cycles, diagnostics.stale_cycles, diagnostics.overflows
    );
    println!("filtered gyro: {:?}", SENSORS.filtered_gyro());
}
