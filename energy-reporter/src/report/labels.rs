/// Column / row labels for known metrics.
const LABELS: &[(&str, &str)] = &[
    // cumulative counters
    ("load_energy", "Load (kWh)"),
    ("pv_energy", "Solar PV (kWh)"),
    ("battery_energy_in", "Battery Charged (kWh)"),
    ("battery_energy_out", "Battery Discharged (kWh)"),
    ("grid_energy_in", "Grid Import (kWh)"),
    ("grid_energy_out", "Grid Export (kWh)"),
    // instantaneous
    ("battery_power", "Battery Power (W)"),
    ("battery_state_of_charge", "Battery SOC (%)"),
    ("battery_temperature", "Battery Temperature (°C)"),
    ("bus_voltage", "Bus Voltage (V)"),
    ("grid_frequency", "Grid Frequency (Hz)"),
    ("grid_power", "Grid Power (W)"),
    ("grid_voltage", "Grid Voltage (V)"),
    ("load_percentage", "Load Percentage (%)"),
    ("load_power", "Load Power (W)"),
    ("pv_power", "PV Power (W)"),
    ("pv_voltage", "PV Voltage (V)"),
    ("pv_current", "PV Current (A)"),
    ("battery_voltage", "Battery Voltage (V)"),
    ("battery_current", "Battery Current (A)"),
    ("battery_charge_power_from_ac", "Battery Charge Power from AC (W)"),
];

const LEGEND: &[(&str, &str)] = &[
    ("battery_power", "Positive means charging; negative means discharging."),
    ("battery_state_of_charge", "Indicates how full the battery is."),
    ("battery_temperature", "The operating temperature of the battery."),
    ("bus_voltage", "The DC voltage on the main system bus."),
    ("grid_frequency", "The frequency of the AC grid (typically around 50 Hz)."),
    ("grid_power", "Positive means power drawn from the grid; negative means power fed back."),
    ("grid_voltage", "The voltage at the grid connection."),
    ("load_percentage", "The percentage of the system's capacity being used."),
    ("load_power", "The power consumed by your home."),
    ("pv_power", "The power output from the solar panels."),
    ("pv_voltage", "The voltage output from the solar panels."),
    ("pv_current", "The current from the solar panels."),
    ("battery_voltage", "The voltage of the battery bank."),
    ("battery_current", "The current entering or leaving the battery."),
    ("battery_charge_power_from_ac", "Power drawn from AC to charge the battery."),
];

/// Display label for a metric; unknown metrics are title-cased
/// (`inverter_temp` -> `Inverter Temp`).
pub fn metric_label(metric: &str) -> String {
    LABELS
        .iter()
        .find(|(m, _)| *m == metric)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| title_case(metric))
}

/// Explanation shown under the summary table, if one exists.
pub fn legend(metric: &str) -> Option<&'static str> {
    LEGEND.iter().find(|(m, _)| *m == metric).map(|(_, text)| *text)
}

fn title_case(metric: &str) -> String {
    metric
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
