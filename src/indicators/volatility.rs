pub mod rolling_std;
